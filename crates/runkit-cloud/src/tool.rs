use std::fmt;

/// External executables the toolkit drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Gcloud,
    Docker,
    Curl,
}

impl Tool {
    pub fn program(&self) -> &'static str {
        match self {
            Self::Gcloud => "gcloud",
            Self::Docker => "docker",
            Self::Curl => "curl",
        }
    }

    pub fn install_hint(&self) -> &'static str {
        match self {
            Self::Gcloud => "https://cloud.google.com/sdk/docs/install",
            Self::Docker => "https://docs.docker.com/get-docker/",
            Self::Curl => "https://curl.se/download.html",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("{tool} not found, install: {}", tool.install_hint())]
    NotFound { tool: Tool, source: std::io::Error },

    #[error("{tool} command failed ({}): {args:?}\n{stderr}", exit_code_display(*code))]
    CommandFailed {
        tool: Tool,
        args: Vec<String>,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{tool} output was not valid UTF-8")]
    InvalidUtf8 {
        tool: Tool,
        source: std::string::FromUtf8Error,
    },

    #[error("failed to write to {tool} stdin")]
    StdinWrite { tool: Tool, source: std::io::Error },
}

impl ExecError {
    /// Exit status of the failed command, when it ran at all.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::CommandFailed { code, .. } => *code,
            _ => None,
        }
    }

    /// Captured stderr text, empty for errors that never reached the tool.
    pub fn stderr(&self) -> &str {
        match self {
            Self::CommandFailed { stderr, .. } => stderr,
            _ => "",
        }
    }
}

fn exit_code_display(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_owned(),
    }
}
