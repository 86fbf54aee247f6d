use std::fs;
use std::io;
use std::path::Path;

/// Copies all regular files and sub folders of `src` into `dst`. A missing `src` copies nothing.
pub fn copy_dir_contents(src: &Path, dst: &Path) -> io::Result<usize> {
    if !src.is_dir() {
        return Ok(0);
    }

    fs::create_dir_all(dst)?;
    let mut copied = 0;

    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());

        if entry.file_type()?.is_dir() {
            copied += copy_dir_contents(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), target)?;
            copied += 1;
        }
    }

    Ok(copied)
}

/// Moves a file, falling back to copy and delete when the paths are on different devices.
pub fn move_file(src: &Path, dst: &Path) -> io::Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }

    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(src, dst)?;
            fs::remove_file(src)
        }
    }
}

/// Removes a folder and everything in it, ignoring folders that do not exist.
pub fn remove_dir_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_and_move() {
        let root = std::env::temp_dir().join(format!("file_ops_{}", uuid::Uuid::new_v4()));
        let src = root.join("src");
        fs::create_dir_all(src.join("sub")).unwrap();
        fs::write(src.join("a.txt"), "a").unwrap();
        fs::write(src.join("sub").join("b.txt"), "b").unwrap();

        let dst = root.join("dst");
        assert_eq!(copy_dir_contents(&src, &dst).unwrap(), 2);
        assert_eq!(fs::read_to_string(dst.join("sub").join("b.txt")).unwrap(), "b");

        move_file(&dst.join("a.txt"), &root.join("moved").join("a.txt")).unwrap();
        assert!(!dst.join("a.txt").exists());
        assert!(root.join("moved").join("a.txt").exists());

        assert_eq!(copy_dir_contents(&root.join("missing"), &dst).unwrap(), 0);

        remove_dir_if_exists(&root).unwrap();
        remove_dir_if_exists(&root).unwrap();
        assert!(!root.exists());
    }
}
