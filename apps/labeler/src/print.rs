//! Print dispatch — hands a rendered document to the OS print spooler.
//!
//! macOS uses `lpr`, other unixes `lp`, Windows the PowerShell print verb.
//! The verb has no copies parameter, so Windows loops once per copy.
//! Dispatch is fire-and-forget toward the spooler: a non-zero exit maps to
//! `LabelError::PrintDispatch` with the spooler's stderr and is never
//! retried.

use std::path::Path;

use tracing::info;

use crate::errors::LabelError;

/// One spooler invocation: program plus arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpoolerCommand {
    pub program: String,
    pub args: Vec<String>,
}

/// Builds the spooler invocations for a platform. Pure so the per-OS shapes
/// are unit-testable anywhere.
pub fn spooler_commands(
    os: &str,
    document: &Path,
    printer: Option<&str>,
    copies: u32,
) -> Vec<SpoolerCommand> {
    let doc = document.to_string_lossy().to_string();
    let copies = copies.max(1);
    match os {
        "macos" => {
            let mut args = Vec::new();
            if let Some(p) = printer {
                args.push("-P".to_string());
                args.push(p.to_string());
            }
            args.push("-#".to_string());
            args.push(copies.to_string());
            args.push(doc);
            vec![SpoolerCommand { program: "lpr".to_string(), args }]
        }
        "windows" => {
            // Start-Process -Verb Print prints one copy; repeat per copy.
            let script = match printer {
                Some(p) => format!(
                    "Start-Process -FilePath '{doc}' -Verb PrintTo -ArgumentList '{p}' -PassThru | Wait-Process"
                ),
                None => format!("Start-Process -FilePath '{doc}' -Verb Print -PassThru | Wait-Process"),
            };
            (0..copies)
                .map(|_| SpoolerCommand {
                    program: "powershell".to_string(),
                    args: vec![
                        "-NoProfile".to_string(),
                        "-Command".to_string(),
                        script.clone(),
                    ],
                })
                .collect()
        }
        _ => {
            let mut args = Vec::new();
            if let Some(p) = printer {
                args.push("-d".to_string());
                args.push(p.to_string());
            }
            args.push("-n".to_string());
            args.push(copies.to_string());
            args.push(doc);
            vec![SpoolerCommand { program: "lp".to_string(), args }]
        }
    }
}

/// Sends the document to the spooler for the current platform.
pub async fn dispatch(
    document: &Path,
    printer: Option<&str>,
    copies: u32,
) -> Result<(), LabelError> {
    for command in spooler_commands(std::env::consts::OS, document, printer, copies) {
        let output = tokio::process::Command::new(&command.program)
            .args(&command.args)
            .output()
            .await
            .map_err(|e| LabelError::PrintDispatch {
                message: format!("failed to launch {}: {e}", command.program),
            })?;
        if !output.status.success() {
            return Err(LabelError::PrintDispatch {
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
    }
    info!(document = %document.display(), copies, printer = printer.unwrap_or("default"), "sent to spooler");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn doc() -> PathBuf {
        PathBuf::from("/tmp/label.pdf")
    }

    #[test]
    fn test_macos_uses_lpr_with_copies_flag() {
        let cmds = spooler_commands("macos", &doc(), Some("Zebra"), 3);
        assert_eq!(cmds.len(), 1);
        assert_eq!(cmds[0].program, "lpr");
        assert_eq!(cmds[0].args, vec!["-P", "Zebra", "-#", "3", "/tmp/label.pdf"]);
    }

    #[test]
    fn test_linux_uses_lp_and_omits_printer_when_unset() {
        let cmds = spooler_commands("linux", &doc(), None, 2);
        assert_eq!(cmds.len(), 1);
        assert_eq!(cmds[0].program, "lp");
        assert_eq!(cmds[0].args, vec!["-n", "2", "/tmp/label.pdf"]);
    }

    #[test]
    fn test_windows_loops_once_per_copy() {
        let cmds = spooler_commands("windows", &doc(), Some("Zebra"), 3);
        assert_eq!(cmds.len(), 3, "print verb has no copies parameter");
        for cmd in &cmds {
            assert_eq!(cmd.program, "powershell");
            let script = cmd.args.last().unwrap();
            assert!(script.contains("-Verb PrintTo"), "named printer uses PrintTo: {script}");
            assert!(script.contains("Zebra"));
        }
    }

    #[test]
    fn test_zero_copies_clamps_to_one() {
        let cmds = spooler_commands("linux", &doc(), None, 0);
        assert_eq!(cmds[0].args, vec!["-n", "1", "/tmp/label.pdf"]);
    }

    #[tokio::test]
    async fn test_dispatch_failure_carries_spooler_stderr() {
        // `lp` with a nonexistent printer fails fast; skip when no spooler
        // binary exists at all (CI containers).
        if !cfg!(target_os = "linux") {
            return;
        }
        let missing = PathBuf::from("/nonexistent/label.pdf");
        let result = dispatch(&missing, Some("no-such-printer"), 1).await;
        assert!(matches!(result, Err(LabelError::PrintDispatch { .. })));
    }
}
