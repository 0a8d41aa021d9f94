//! Typed fzf flags.
//!
//! [`FzfOptions`] only ever emits flags that were set, so a default value
//! leaves fzf's own defaults (and `FZF_DEFAULT_OPTS`, when inherited) alone.

/// Where the prompt and list go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// Prompt at the bottom.
    #[default]
    Default,
    /// Prompt at the top.
    Reverse,
    /// Prompt at the bottom, list top-down.
    ReverseList,
}

impl Layout {
    pub const ALL: &[Layout] = &[Layout::Default, Layout::Reverse, Layout::ReverseList];

    /// Value accepted by `--layout=` and by the config file.
    pub fn label(self) -> &'static str {
        match self {
            Layout::Default => "default",
            Layout::Reverse => "reverse",
            Layout::ReverseList => "reverse-list",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|layout| layout.label().eq_ignore_ascii_case(s.trim()))
    }
}

/// Case sensitivity of the matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseMatching {
    /// Case-insensitive unless the query has an uppercase letter.
    #[default]
    Smart,
    Ignore,
    Respect,
}

/// Flags passed to the selector on every run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FzfOptions {
    pub multi: bool,
    pub prompt: Option<String>,
    pub header: Option<String>,
    pub query: Option<String>,
    /// e.g. `"40%"` or `"20"`; unset means fullscreen.
    pub height: Option<String>,
    pub layout: Layout,
    pub case: CaseMatching,
    pub exact: bool,
    pub no_sort: bool,
    pub cycle: bool,
    pub border: bool,
    /// Preview command, with fzf's `{}` placeholders.
    pub preview: Option<String>,
    /// Accept immediately when only one line matches the initial query.
    pub select_1: bool,
    /// Exit immediately when nothing matches the initial query.
    pub exit_0: bool,
    /// Print the final query before the selection.
    pub print_query: bool,
    /// Keys that accept the selection; the key used is printed first.
    pub expect: Vec<String>,
    /// Appended verbatim after every typed flag.
    pub extra_args: Vec<String>,
}

impl FzfOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn multi(mut self, multi: bool) -> Self {
        self.multi = multi;
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn height(mut self, height: impl Into<String>) -> Self {
        self.height = Some(height.into());
        self
    }

    pub fn layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    pub fn case(mut self, case: CaseMatching) -> Self {
        self.case = case;
        self
    }

    pub fn exact(mut self, exact: bool) -> Self {
        self.exact = exact;
        self
    }

    pub fn no_sort(mut self, no_sort: bool) -> Self {
        self.no_sort = no_sort;
        self
    }

    pub fn cycle(mut self, cycle: bool) -> Self {
        self.cycle = cycle;
        self
    }

    pub fn border(mut self, border: bool) -> Self {
        self.border = border;
        self
    }

    pub fn preview(mut self, command: impl Into<String>) -> Self {
        self.preview = Some(command.into());
        self
    }

    pub fn select_1(mut self, select_1: bool) -> Self {
        self.select_1 = select_1;
        self
    }

    pub fn exit_0(mut self, exit_0: bool) -> Self {
        self.exit_0 = exit_0;
        self
    }

    pub fn print_query(mut self, print_query: bool) -> Self {
        self.print_query = print_query;
        self
    }

    pub fn expect<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expect = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    /// Render the command line, one element per flag.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.multi {
            args.push("--multi".to_string());
        }
        if let Some(ref prompt) = self.prompt {
            args.push(format!("--prompt={prompt}"));
        }
        if let Some(ref header) = self.header {
            args.push(format!("--header={header}"));
        }
        if let Some(ref query) = self.query {
            args.push(format!("--query={query}"));
        }
        if let Some(ref height) = self.height {
            args.push(format!("--height={height}"));
        }
        if self.layout != Layout::Default {
            args.push(format!("--layout={}", self.layout.label()));
        }
        match self.case {
            CaseMatching::Smart => {}
            CaseMatching::Ignore => args.push("-i".to_string()),
            CaseMatching::Respect => args.push("+i".to_string()),
        }
        if self.exact {
            args.push("--exact".to_string());
        }
        if self.no_sort {
            args.push("--no-sort".to_string());
        }
        if self.cycle {
            args.push("--cycle".to_string());
        }
        if self.border {
            args.push("--border".to_string());
        }
        if let Some(ref preview) = self.preview {
            args.push(format!("--preview={preview}"));
        }
        if self.select_1 {
            args.push("--select-1".to_string());
        }
        if self.exit_0 {
            args.push("--exit-0".to_string());
        }
        if self.print_query {
            args.push("--print-query".to_string());
        }
        if !self.expect.is_empty() {
            args.push(format!("--expect={}", self.expect.join(",")));
        }
        args.extend(self.extra_args.iter().cloned());

        args
    }
}
