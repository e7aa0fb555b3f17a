//! Tests for CLI parsing and derived settings.

use super::*;
use rstest::rstest;

#[test]
fn cli_parses_build_defaults() {
    let cli = Cli::parse_from(["jarsmith", "build"]);
    assert_eq!(cli.command, Command::Build(BuildArgs::default()));
    assert!(cli.config.is_none());
    assert!(cli.root.is_none());
    assert_eq!(cli.verbosity, 0);
    assert!(!cli.quiet);
    assert!(!cli.json);
    assert!(!cli.skip_build());
}

#[test]
fn cli_requires_a_command() {
    assert!(Cli::try_parse_from(["jarsmith"]).is_err());
}

#[test]
fn cli_parses_publish_options() {
    let cli = Cli::parse_from([
        "jarsmith",
        "publish",
        "--dry-run",
        "--release-version",
        "1.2.0",
        "--skip-build",
    ]);
    match &cli.command {
        Command::Publish(args) => {
            assert!(args.dry_run);
            assert_eq!(args.release_version.as_deref(), Some("1.2.0"));
        }
        other => panic!("expected Publish command, got {other:?}"),
    }
    assert!(cli.skip_build());
}

#[test]
fn cli_accepts_global_flags_after_command() {
    let cli = Cli::parse_from(["jarsmith", "clean", "--root", "/work/jsky", "-q", "--json"]);
    assert_eq!(cli.command, Command::Clean);
    assert_eq!(cli.root, Some(Utf8PathBuf::from("/work/jsky")));
    assert!(cli.quiet);
    assert!(cli.json);
}

#[test]
fn cli_rejects_quiet_with_verbose() {
    assert!(Cli::try_parse_from(["jarsmith", "-q", "-v", "build"]).is_err());
}

#[test]
fn cli_rejects_dry_run_on_build() {
    assert!(Cli::try_parse_from(["jarsmith", "build", "--dry-run"]).is_err());
}

#[rstest]
#[case::default(&["jarsmith", "build"], "warn")]
#[case::verbose(&["jarsmith", "-v", "build"], "info")]
#[case::very_verbose(&["jarsmith", "-vv", "build"], "debug")]
#[case::quiet(&["jarsmith", "-q", "build"], "error")]
fn log_level_follows_flags(#[case] args: &[&str], #[case] expected: &str) {
    let cli = Cli::parse_from(args);
    assert_eq!(cli.log_level(), expected);
}

#[rstest]
#[case::none(None, "/cwd")]
#[case::relative(Some("project"), "/cwd/project")]
#[case::absolute(Some("/elsewhere"), "/elsewhere")]
fn project_root_resolves_against_cwd(#[case] root: Option<&str>, #[case] expected: &str) {
    let mut args = vec!["jarsmith"];
    if let Some(root) = root {
        args.extend(["--root", root]);
    }
    args.push("clean");
    let cli = Cli::parse_from(args);
    assert_eq!(cli.project_root(Utf8Path::new("/cwd")), Utf8PathBuf::from(expected));
}

#[test]
fn config_path_defaults_to_root_file() {
    let cli = Cli::parse_from(["jarsmith", "build"]);
    assert_eq!(
        cli.config_path(Utf8Path::new("/work/jsky")),
        Utf8PathBuf::from("/work/jsky/jarsmith.toml")
    );

    let cli = Cli::parse_from(["jarsmith", "--config", "/etc/jarsmith.toml", "build"]);
    assert_eq!(
        cli.config_path(Utf8Path::new("/work/jsky")),
        Utf8PathBuf::from("/etc/jarsmith.toml")
    );
}
