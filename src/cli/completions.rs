use clap::Parser;

/// Arguments for completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    intunepack completions bash > ~/.bash_completion.d/intunepack\n\n\
                  Generate zsh completions:\n    intunepack completions zsh > ~/.zfunc/_intunepack\n\n\
                  Generate PowerShell completions:\n    intunepack completions powershell >> $PROFILE")]
pub struct CompletionsArgs {
    /// Shell type (bash, elvish, fish, powershell, zsh)
    pub shell: String,
}
