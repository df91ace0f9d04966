use clap::Parser;

/// Arguments for completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    lampkitctl completions bash > /etc/bash_completion.d/lampkitctl\n\n\
                  Generate zsh completions:\n    lampkitctl completions zsh > ~/.zfunc/_lampkitctl\n\n\
                  Generate fish completions:\n    lampkitctl completions fish > ~/.config/fish/completions/lampkitctl.fish")]
pub struct CompletionsArgs {
    /// Shell type (bash, elvish, fish, powershell, zsh)
    pub shell: String,
}
