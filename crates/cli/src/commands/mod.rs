pub mod config;
pub mod doctor;
pub mod permissions;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

impl CommandResult {
    pub fn success(output: impl Into<String>) -> Self {
        CommandResult { exit_code: 0, output: output.into() }
    }

    pub fn failure(exit_code: u8, output: impl Into<String>) -> Self {
        CommandResult { exit_code, output: output.into() }
    }
}
