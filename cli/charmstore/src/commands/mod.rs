mod archive;
mod envs;
mod search;
mod show;
mod versions;

use anyhow::{Context, Result};
use bpaf::Bpaf;
use charmstore_client::{CharmstoreClient, EnvironmentClient};
use indoc::formatdoc;
use tracing::debug;

use crate::config::{CONFIG_FILE, Config};

const DESCRIPTION: &str = "Browse the juju charmstore and manage JEM environments";

fn vec_len<T>(x: Vec<T>) -> usize {
    Vec::len(&x)
}

#[derive(Bpaf, Clone, Copy, Debug)]
pub enum Verbosity {
    Verbose(
        /// Increase logging verbosity
        ///
        /// Invoke multiple times for increasing detail.
        #[bpaf(short('v'), long("verbose"), req_flag(()), many, map(vec_len))]
        usize,
    ),

    /// Silence logs except for errors
    #[bpaf(short, long)]
    Quiet,
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Verbose(0)
    }
}

#[derive(Bpaf)]
#[bpaf(options, version, descr(DESCRIPTION))]
pub struct CharmstoreCli(#[bpaf(external(charmstore_args))] pub CharmstoreArgs);

/// Main charmstore args parser
///
/// To parse the whole CLI, use [`CharmstoreCli`] via [`charmstore_cli()`].
#[derive(Debug, Bpaf)]
#[bpaf(ignore_rustdoc)]
pub struct CharmstoreArgs {
    #[bpaf(external, fallback(Default::default()))]
    pub verbosity: Verbosity,

    #[bpaf(external(commands))]
    command: Commands,
}

impl CharmstoreArgs {
    pub async fn handle(self, config: Config) -> Result<()> {
        debug!(charmstore_url = %config.charmstore_url, "running command");
        match self.command {
            Commands::Show(args) => args.handle(&charmstore_client(&config)?).await,
            Commands::Search(args) => args.handle(&config, &charmstore_client(&config)?).await,
            Commands::Versions(args) => args.handle(&charmstore_client(&config)?).await,
            Commands::File(args) => args.handle(&charmstore_client(&config)?).await,
            Commands::DiagramUrl(args) => {
                args.handle(&charmstore_client(&config)?);
                Ok(())
            },
            Commands::BundleYaml(args) => args.handle(&charmstore_client(&config)?).await,
            Commands::Envs(args) => args.handle(&environment_client(&config)?).await,
            Commands::Servers(args) => args.handle(&environment_client(&config)?).await,
        }
    }
}

#[derive(Bpaf, Clone, Debug)]
enum Commands {
    /// Show details about a charm or bundle
    #[bpaf(command)]
    Show(#[bpaf(external(show::show))] show::Show),

    /// Search the charmstore
    #[bpaf(command)]
    Search(#[bpaf(external(search::search))] search::Search),

    /// List the revisions of a charm in the same series
    #[bpaf(command)]
    Versions(#[bpaf(external(versions::versions))] versions::Versions),

    /// Print a file from the archive of a charm or bundle
    #[bpaf(command)]
    File(#[bpaf(external(archive::file))] archive::File),

    /// Print the URL of a bundle diagram
    #[bpaf(command("diagram-url"))]
    DiagramUrl(#[bpaf(external(archive::diagram_url))] archive::DiagramUrl),

    /// Print the deployer file of a bundle
    #[bpaf(command("bundle-yaml"))]
    BundleYaml(#[bpaf(external(archive::bundle_yaml))] archive::BundleYaml),

    /// List environments on the environment manager
    #[bpaf(command)]
    Envs(#[bpaf(external(envs::envs))] envs::Envs),

    /// List state servers known to the environment manager
    #[bpaf(command)]
    Servers(#[bpaf(external(envs::servers))] envs::Servers),
}

fn charmstore_client(config: &Config) -> Result<CharmstoreClient> {
    CharmstoreClient::new(config.charmstore_client_config())
        .context("Could not create charmstore client")
}

fn environment_client(config: &Config) -> Result<EnvironmentClient> {
    let jem_config = config.environment_client_config().with_context(|| {
        formatdoc! {"
            No environment manager configured.
            Set 'jem_url' in {CONFIG_FILE} or '$CHARMSTORE_JEM_URL'."}
    })?;
    EnvironmentClient::new(jem_config).context("Could not create environment manager client")
}


#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use pretty_assertions::assert_eq;

    use super::*;

    fn parse(args: &[&str]) -> CharmstoreArgs {
        let CharmstoreCli(args) = charmstore_cli().run_inner(args).unwrap();
        args
    }

    #[test]
    fn verbosity_flags() {
        assert!(matches!(parse(&["show", "cs:mysql"]).verbosity, Verbosity::Verbose(0)));
        assert!(matches!(
            parse(&["-vv", "show", "cs:mysql"]).verbosity,
            Verbosity::Verbose(2)
        ));
        assert!(matches!(parse(&["-q", "show", "cs:mysql"]).verbosity, Verbosity::Quiet));
    }

    #[test]
    fn search_arguments() {
        let args = parse(&[
            "search",
            "--limit",
            "5",
            "--filter",
            "type=bundle",
            "-f",
            "promulgated",
            "wiki",
        ]);
        let Commands::Search(search) = args.command else {
            panic!("expected search command");
        };
        assert_eq!(search.text, "wiki");
        assert_eq!(search.limit, NonZeroU32::new(5));
        assert_eq!(search.filters.len(), 2);
    }

    #[test]
    fn hyphenated_commands() {
        assert!(matches!(
            parse(&["diagram-url", "cs:bundle/wiki-1"]).command,
            Commands::DiagramUrl(_)
        ));
        assert!(matches!(
            parse(&["bundle-yaml", "cs:bundle/wiki-1"]).command,
            Commands::BundleYaml(_)
        ));
    }

    #[test]
    fn zero_limit_is_rejected() {
        let result = charmstore_cli().run_inner(&["search", "--limit", "0", "wiki"][..]);
        assert!(result.is_err());
    }

    #[test]
    fn envs_require_jem_url() {
        let config = Config {
            charmstore_url: "https://api.example.com/charmstore/".to_string(),
            api_version: "v4".to_string(),
            jem_url: None,
            auth_token: None,
            search_limit: None,
        };
        let err = environment_client(&config).unwrap_err();
        assert!(err.to_string().contains("jem_url"), "{err}");
    }
}
