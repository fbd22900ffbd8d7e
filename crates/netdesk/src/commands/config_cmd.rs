//! Config command handlers. These never contact the backend.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = config::config_file(global);
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let shown = config::load(global)?.redacted();
            let as_toml =
                toml::to_string_pretty(&shown).map_err(|e| CliError::Render(e.to_string()))?;
            let out = output::render_single(
                global.output,
                &shown,
                |_| format!("# {}\n{}", path.display(), as_toml.trim_end()),
                |_| path.display().to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
