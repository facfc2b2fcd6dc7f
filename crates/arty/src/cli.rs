//! CLI argument parsing with clap
//!
//! Every flag also binds a `PARAMETER_*` variable, which is how pipeline
//! steps pass plugin settings.

use arty_actions::{
    Actions, CopyAction, DeleteAction, DockerPromoteAction, SetPropAction, UploadAction,
};
use arty_core::types::{
    PluginConfig, DEFAULT_HTTP_CLIENT_RETRIES, DEFAULT_HTTP_CLIENT_RETRY_WAIT_MS,
};
use camino::Utf8PathBuf;
use clap::{Args, Parser};

use crate::secrets::SecretSources;

/// Run one action against JFrog Artifactory
#[derive(Parser, Debug)]
#[command(name = "arty")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(flatten)]
    pub http: HttpArgs,

    #[command(flatten)]
    pub params: ActionArgs,
}

#[derive(Args, Debug, Clone)]
#[command(next_help_heading = "Connection")]
pub struct ConnectionArgs {
    /// Action to perform: copy, delete, set-prop, upload, docker-promote
    #[arg(long, env = "PARAMETER_ACTION")]
    pub action: Option<String>,

    /// Artifactory server URL
    #[arg(long, env = "PARAMETER_URL")]
    pub url: Option<String>,

    /// User name for basic authentication
    #[arg(long, env = "PARAMETER_USERNAME")]
    pub username: Option<String>,

    /// Password for basic authentication
    #[arg(long, env = "PARAMETER_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// API key
    #[arg(long, env = "PARAMETER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Access token
    #[arg(long, env = "PARAMETER_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Log what would change without changing anything
    #[arg(long, env = "PARAMETER_DRY_RUN")]
    pub dry_run: bool,

    /// Log level filter (trace, debug, info, warn, error)
    #[arg(long, env = "PARAMETER_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

#[derive(Args, Debug, Clone)]
#[command(next_help_heading = "HTTP client")]
pub struct HttpArgs {
    /// Retries after a failed request; negative values use the default
    #[arg(
        long,
        env = "PARAMETER_HTTP_CLIENT_RETRIES",
        default_value_t = DEFAULT_HTTP_CLIENT_RETRIES,
        allow_negative_numbers = true
    )]
    pub http_client_retries: i64,

    /// Minimum wait in milliseconds between connection retries
    #[arg(
        long,
        env = "PARAMETER_HTTP_CLIENT_RETRY_WAIT_MS",
        default_value_t = DEFAULT_HTTP_CLIENT_RETRY_WAIT_MS
    )]
    pub http_client_retry_wait_ms: u64,

    /// PEM client certificate for mutual TLS
    #[arg(long, env = "PARAMETER_CLIENT_CERT_PATH")]
    pub client_cert_path: Option<Utf8PathBuf>,

    /// PEM private key for the client certificate
    #[arg(long, env = "PARAMETER_CLIENT_CERT_KEY_PATH")]
    pub client_cert_key_path: Option<Utf8PathBuf>,

    /// Skip server certificate verification
    #[arg(long, env = "PARAMETER_INSECURE_TLS")]
    pub insecure_tls: bool,
}

#[derive(Args, Debug, Clone, Default)]
#[command(next_help_heading = "Action")]
pub struct ActionArgs {
    /// Source pattern (copy, delete, set-prop) or target path (upload)
    #[arg(long, env = "PARAMETER_PATH")]
    pub path: Option<String>,

    /// Copy target path
    #[arg(long, env = "PARAMETER_TARGET")]
    pub target: Option<String>,

    /// Local files to upload
    #[arg(long, env = "PARAMETER_SOURCES", value_delimiter = ',')]
    pub sources: Vec<String>,

    /// Drop the source folder hierarchy
    #[arg(long, env = "PARAMETER_FLAT")]
    pub flat: bool,

    /// Match in subfolders too
    #[arg(long, env = "PARAMETER_RECURSIVE")]
    pub recursive: bool,

    /// Upload folders as well as files
    #[arg(long, env = "PARAMETER_INCLUDE_DIRS")]
    pub include_dirs: bool,

    /// Treat upload sources as regular expressions
    #[arg(long, env = "PARAMETER_REGEXP")]
    pub regexp: bool,

    /// Properties to set, as a JSON or YAML list of {name, value, values}
    #[arg(long, env = "PARAMETER_PROPS")]
    pub props: Option<String>,

    /// Build properties attached to uploaded files (key=value;key2=value2)
    #[arg(long, env = "PARAMETER_BUILD_PROPS")]
    pub build_props: Option<String>,

    /// Repository holding the image to promote (defaults to the target repository)
    #[arg(long, env = "PARAMETER_SOURCE_REPO")]
    pub source_repo: Option<String>,

    /// Repository to promote the image to
    #[arg(long, env = "PARAMETER_TARGET_REPO")]
    pub target_repo: Option<String>,

    /// Image name to promote
    #[arg(long, env = "PARAMETER_DOCKER_REGISTRY")]
    pub docker_registry: Option<String>,

    /// Image name after promotion (defaults to the image name)
    #[arg(long, env = "PARAMETER_TARGET_DOCKER_REGISTRY")]
    pub target_docker_registry: Option<String>,

    /// Tag to promote
    #[arg(long, env = "PARAMETER_TAG")]
    pub tag: Option<String>,

    /// Tags to promote to
    #[arg(long, env = "PARAMETER_TARGET_TAGS", value_delimiter = ',')]
    pub target_tags: Vec<String>,

    /// Copy the image instead of moving it
    #[arg(long, env = "PARAMETER_COPY")]
    pub copy: bool,

    /// Record the promotion time as a promoted_on property
    #[arg(long, env = "PARAMETER_PROMOTE_PROPERTY")]
    pub promote_property: bool,
}

impl Cli {
    /// Plugin configuration, with missing connection values taken from
    /// `secrets`
    pub fn config(&self, secrets: &SecretSources) -> PluginConfig {
        let mut connection = self.connection.clone();
        secrets.fill(&mut connection.action, "action");
        secrets.fill(&mut connection.url, "url");
        secrets.fill(&mut connection.username, "username");
        secrets.fill(&mut connection.password, "password");
        secrets.fill(&mut connection.api_key, "api_key");
        secrets.fill(&mut connection.token, "token");

        PluginConfig {
            action: connection.action.unwrap_or_default(),
            url: connection.url.unwrap_or_default(),
            username: connection.username,
            password: connection.password,
            api_key: connection.api_key,
            token: connection.token,
            dry_run: connection.dry_run,
            http_client_retries: self.http.http_client_retries,
            http_client_retry_wait_ms: self.http.http_client_retry_wait_ms,
            client_cert_path: self.http.client_cert_path.clone(),
            client_cert_key_path: self.http.client_cert_key_path.clone(),
            insecure_tls: self.http.insecure_tls,
            log_level: connection.log_level,
        }
    }

    pub fn actions(&self) -> Actions {
        let args = &self.params;
        let path = args.path.clone().unwrap_or_default();
        let target_repo = args.target_repo.clone().unwrap_or_default();

        Actions {
            copy: CopyAction {
                path: path.clone(),
                target: args.target.clone().unwrap_or_default(),
                flat: args.flat,
                recursive: args.recursive,
            },
            delete: DeleteAction {
                path: path.clone(),
                recursive: args.recursive,
            },
            set_prop: SetPropAction {
                path: path.clone(),
                recursive: args.recursive,
                raw_props: args.props.clone().unwrap_or_default(),
                props: Vec::new(),
            },
            upload: UploadAction {
                sources: non_empty(&args.sources),
                path,
                flat: args.flat,
                include_dirs: args.include_dirs,
                recursive: args.recursive,
                regexp: args.regexp,
                build_props: args.build_props.clone(),
            },
            docker_promote: DockerPromoteAction {
                source_repo: args.source_repo.clone().unwrap_or_default(),
                target_repo,
                docker_registry: args.docker_registry.clone().unwrap_or_default(),
                target_docker_registry: args.target_docker_registry.clone().unwrap_or_default(),
                tag: args.tag.clone().unwrap_or_default(),
                target_tags: non_empty(&args.target_tags),
                copy: args.copy,
                promote_property: args.promote_property,
            },
        }
    }
}

/// Trim list entries and drop blanks left by trailing commas
fn non_empty(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn no_secrets() -> SecretSources {
        SecretSources::with_dirs(Vec::new()).without_env()
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    #[serial]
    fn test_copy_flags() {
        let cli = Cli::try_parse_from([
            "arty",
            "--action",
            "copy",
            "--url",
            "https://myarti.com/artifactory",
            "--api-key",
            "superSecretAPIKey",
            "--path",
            "libs/foo/*",
            "--target",
            "release/",
            "--flat",
            "--recursive",
        ])
        .unwrap();

        let config = cli.config(&no_secrets());
        assert_eq!(config.action, "copy");
        assert_eq!(config.api_key.as_deref(), Some("superSecretAPIKey"));
        assert_eq!(config.http_client_retries, 3);
        assert_eq!(config.http_client_retry_wait_ms, 500);

        let copy = cli.actions().copy;
        assert_eq!(copy.path, "libs/foo/*");
        assert_eq!(copy.target, "release/");
        assert!(copy.flat && copy.recursive);
    }

    #[test]
    #[serial]
    fn test_negative_retries_parse() {
        let cli = Cli::try_parse_from(["arty", "--http-client-retries", "-1"]).unwrap();
        assert_eq!(cli.http.http_client_retries, -1);
    }

    #[test]
    #[serial]
    fn test_lists_split_on_commas() {
        let cli = Cli::try_parse_from([
            "arty",
            "--sources",
            "dist/*.jar,build/*.pom,",
            "--target-tags",
            "v1, latest",
        ])
        .unwrap();

        let actions = cli.actions();
        assert_eq!(actions.upload.sources, vec!["dist/*.jar", "build/*.pom"]);
        assert_eq!(actions.docker_promote.target_tags, vec!["v1", "latest"]);
    }

    #[test]
    #[serial]
    fn test_parameter_env_binding() {
        env::set_var("PARAMETER_ACTION", "docker-promote");
        env::set_var("PARAMETER_TARGET_REPO", "docker");
        env::set_var("PARAMETER_DOCKER_REGISTRY", "github/octocat");
        env::set_var("PARAMETER_PROMOTE_PROPERTY", "true");
        env::set_var("PARAMETER_HTTP_CLIENT_RETRIES", "5");

        let cli = Cli::try_parse_from(["arty"]).unwrap();

        env::remove_var("PARAMETER_ACTION");
        env::remove_var("PARAMETER_TARGET_REPO");
        env::remove_var("PARAMETER_DOCKER_REGISTRY");
        env::remove_var("PARAMETER_PROMOTE_PROPERTY");
        env::remove_var("PARAMETER_HTTP_CLIENT_RETRIES");

        assert_eq!(cli.config(&no_secrets()).action, "docker-promote");
        assert_eq!(cli.http.http_client_retries, 5);

        let promote = cli.actions().docker_promote;
        assert_eq!(promote.target_repo, "docker");
        assert_eq!(promote.docker_registry, "github/octocat");
        assert!(promote.promote_property);
    }

    #[test]
    #[serial]
    fn test_flag_wins_over_secret_file() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("username"), "from-file\n").unwrap();
        std::fs::write(dir.path().join("password"), "file-password\n").unwrap();
        let secrets = SecretSources::with_dirs(vec![
            Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap(),
        ])
        .without_env();

        let cli = Cli::try_parse_from(["arty", "--username", "octocat"]).unwrap();
        let config = cli.config(&secrets);

        assert_eq!(config.username.as_deref(), Some("octocat"));
        assert_eq!(config.password.as_deref(), Some("file-password"));
    }
}
