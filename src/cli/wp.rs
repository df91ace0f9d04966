use clap::Parser;
use std::path::PathBuf;

/// Arguments for the wp-permissions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Reset permissions of a WordPress install:\n    lampkitctl wp-permissions /var/www/blog.test")]
pub struct WpPermissionsArgs {
    /// WordPress document root
    pub doc_root: PathBuf,
}

/// Arguments for the generate-ssl command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Request a certificate for an enabled site:\n    lampkitctl generate-ssl shop.example.com")]
pub struct GenerateSslArgs {
    /// Domain of an enabled virtual host
    pub domain: String,
}

impl WpPermissionsArgs {
    pub fn to_argv(&self) -> Vec<String> {
        vec![
            "wp-permissions".to_string(),
            self.doc_root.to_string_lossy().into_owned(),
        ]
    }
}

impl GenerateSslArgs {
    pub fn to_argv(&self) -> Vec<String> {
        vec!["generate-ssl".to_string(), self.domain.clone()]
    }
}
