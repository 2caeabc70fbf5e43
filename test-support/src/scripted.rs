use serde_json::Value;

/// A throwaway language server written as a `sh -c` script.
///
/// The script writes every queued message up front, then consumes stdin
/// until the client closes it. Responses are queued in the order the
/// client will ask for them, so correlation still has to match ids.
#[derive(Debug, Default, Clone)]
pub struct ScriptedServer {
    steps: Vec<String>,
}

impl ScriptedServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a framed message.
    pub fn message(mut self, body: &Value) -> Self {
        let content = body.to_string();
        self.steps.push(format!(
            "printf 'Content-Length: %d\\r\\n\\r\\n%s' {} {}",
            content.len(),
            shell_quote(&content)
        ));
        self
    }

    /// Queue a line on stderr.
    pub fn log(mut self, line: &str) -> Self {
        self.steps
            .push(format!("printf '%s\\n' {} >&2", shell_quote(line)));
        self
    }

    /// Read stdin to EOF and exit with `code`.
    pub fn script(&self, code: i32) -> String {
        let mut script = self.steps.join("\n");
        script.push_str(&format!("\ncat > /dev/null\nexit {code}\n"));
        script
    }

    /// Program and arguments that run the script.
    pub fn command(&self, code: i32) -> (String, Vec<String>) {
        ("sh".to_string(), vec!["-c".to_string(), self.script(code)])
    }

    /// A server that reads requests forever and never answers.
    pub fn silent() -> (String, Vec<String>) {
        (
            "sh".to_string(),
            vec!["-c".to_string(), "cat > /dev/null".to_string()],
        )
    }

    /// A server that exits before reading anything.
    pub fn exits_immediately(code: i32) -> (String, Vec<String>) {
        ("sh".to_string(), vec!["-c".to_string(), format!("exit {code}")])
    }
}

fn shell_quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', r"'\''"))
}
