//! Window listing through `wmctrl` on X11 desktops.

use super::window::{WindowInfo, WindowState};
use crate::util::Rect;

#[cfg(feature = "desktop")]
use super::window::{WindowEnumerator, WindowSelector};
#[cfg(feature = "desktop")]
use crate::util::{LocateError, LocateResult};

/// Parses `wmctrl -l -p -G -x` output.
///
/// Each line reads `id desktop pid x y width height class host title...`.
/// Malformed lines are skipped. Windows with an empty geometry are reported
/// as hidden, and a class of `N/A` becomes an empty class name.
pub fn parse_wmctrl_windows(output: &str) -> Vec<WindowInfo> {
    output.lines().filter_map(parse_line).collect()
}

fn next_field<'a>(rest: &mut &'a str) -> Option<&'a str> {
    let trimmed = rest.trim_start();
    if trimmed.is_empty() {
        return None;
    }
    let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
    let (field, tail) = trimmed.split_at(end);
    *rest = tail;
    Some(field)
}

fn parse_line(line: &str) -> Option<WindowInfo> {
    let mut rest = line;
    let id = next_field(&mut rest)?;
    let handle = u64::from_str_radix(id.trim_start_matches("0x"), 16).ok()?;
    let _desktop = next_field(&mut rest)?;
    let _pid = next_field(&mut rest)?;
    let x: i32 = next_field(&mut rest)?.parse().ok()?;
    let y: i32 = next_field(&mut rest)?.parse().ok()?;
    let width: u32 = next_field(&mut rest)?.parse().ok()?;
    let height: u32 = next_field(&mut rest)?.parse().ok()?;
    let class_name = next_field(&mut rest)?;
    let _host = next_field(&mut rest)?;
    let title = rest.trim();

    let state = if width == 0 || height == 0 {
        WindowState::Hidden
    } else {
        WindowState::Normal
    };
    let class_name = if class_name == "N/A" { "" } else { class_name };
    Some(
        WindowInfo::new(handle, title, Rect::new(x, y, width, height))
            .with_class(class_name)
            .with_state(state),
    )
}

/// Top-level windows of the running X11 session, listed with `wmctrl`.
///
/// `wmctrl` reports neither minimization nor client insets, so every window
/// with a geometry counts as visible and its client area equals its frame.
#[cfg(feature = "desktop")]
#[derive(Clone, Copy, Debug, Default)]
pub struct DesktopWindows;

#[cfg(feature = "desktop")]
impl WindowEnumerator for DesktopWindows {
    fn find_windows(&self, selector: &WindowSelector) -> LocateResult<Vec<WindowInfo>> {
        let output = std::process::Command::new("wmctrl")
            .args(["-l", "-p", "-G", "-x"])
            .output()
            .map_err(|e| LocateError::WindowEnumeration(format!("wmctrl: {e}")))?;
        if !output.status.success() {
            return Err(LocateError::WindowEnumeration(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_wmctrl_windows(&stdout)
            .into_iter()
            .filter(|w| selector.matches(w))
            .collect())
    }
}
