//! Detection of the external programs snapshots depend on.

use std::path::PathBuf;
use std::process::Command;

/// Programs the snapshot operation shells out to.
pub const SNAPSHOT_TOOLS: &[&str] = &["ffmpeg"];

/// What was found when probing for a program.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: String,
    pub available: bool,
    /// First line of the program's version banner.
    pub version: Option<String>,
    /// Resolved location on `PATH`.
    pub path: Option<PathBuf>,
}

impl ToolInfo {
    fn missing(name: &str) -> Self {
        Self {
            name: name.to_string(),
            available: false,
            version: None,
            path: None,
        }
    }
}

/// Probe `name` by running its version flag.
///
/// ffmpeg-family programs take `-version`; everything else `--version`.
///
/// # Example
///
/// ```no_run
/// use mama_av::check_tool;
///
/// let info = check_tool("ffmpeg");
/// if info.available {
///     println!("ffmpeg version: {:?}", info.version);
/// }
/// ```
pub fn check_tool(name: &str) -> ToolInfo {
    let flag = if name.starts_with("ff") {
        "-version"
    } else {
        "--version"
    };

    let output = match Command::new(name).arg(flag).output() {
        Ok(output) if output.status.success() => output,
        _ => return ToolInfo::missing(name),
    };

    ToolInfo {
        name: name.to_string(),
        available: true,
        version: String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .map(str::to_string),
        path: which::which(name).ok(),
    }
}

/// Probe every program in [`SNAPSHOT_TOOLS`].
pub fn check_tools() -> Vec<ToolInfo> {
    SNAPSHOT_TOOLS.iter().map(|name| check_tool(name)).collect()
}
