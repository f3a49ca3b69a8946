use clap::CommandFactory;
use clap_complete::{generate, Shell};
use std::io::Write;

use crate::Cli;

/// Write the completion script for `shell` to `out`.
pub fn run(shell: Shell, out: &mut dyn Write) {
    let mut cmd = Cli::command();
    let bin = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin, out);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bash_script_covers_subcommands() {
        let mut buf = Vec::new();
        run(Shell::Bash, &mut buf);
        let script = String::from_utf8(buf).unwrap();
        assert!(script.contains("apim-bulk"));
        assert!(script.contains("export"));
        assert!(script.contains("clean-logs"));
    }
}
