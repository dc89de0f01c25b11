use std::io;
use std::path::Path;
use std::process::Command;

#[cfg(target_os = "windows")]
const FILE_MANAGER: &str = "explorer";
#[cfg(target_os = "macos")]
const FILE_MANAGER: &str = "open";
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const FILE_MANAGER: &str = "xdg-open";

/// Reveal `path` in the platform file manager without waiting for it.
pub(crate) fn open_folder(path: &Path) -> io::Result<()> {
    if !path.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} is not a directory", path.display()),
        ));
    }
    Command::new(FILE_MANAGER).arg(path).spawn().map(|_| ())
}
