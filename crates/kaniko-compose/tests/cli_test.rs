#![allow(deprecated)] // TODO: cargo_bin → cargo_bin_cmd! へ移行

mod common;

use assert_cmd::Command;
use common::TestProject;
use predicates::prelude::*;

const TWO_SERVICES: &str = r#"
services:
  web:
    build:
      context: ./web
      dockerfile: Dockerfile
    image: "org/web:latest"
  api:
    build:
      context: ./api
    image: "org/api:latest"
"#;

/// CLIヘルプが正しく表示されることを確認
#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("kaniko-compose").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--compose-file"))
        .stdout(predicate::str::contains("--sequential"))
        .stdout(predicate::str::contains("--push"))
        .stdout(predicate::str::contains("--dry-run"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("kaniko-compose").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("kaniko-compose"));
}

#[test]
fn test_missing_compose_file() {
    let project = TestProject::new();
    project
        .command()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Compose file not found"));
}

#[test]
fn test_invalid_worker_count() {
    let project = TestProject::new();
    project.write_compose(TWO_SERVICES);
    project
        .command()
        .args(["--workers", "0"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("workers must be at least 1"));
}

#[test]
fn test_nothing_to_do() {
    let project = TestProject::new();
    project.write_compose(
        r#"
services:
  db:
    image: postgres:16
  cache:
"#,
    );
    project
        .command()
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to do."))
        .stdout(predicate::str::contains("Built: 0"));
}

#[test]
fn test_no_services_is_fatal() {
    let project = TestProject::new();
    project.write_compose("version: '3'\n");
    project
        .command()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No `services` section"));
}

#[test]
fn test_unknown_service() {
    let project = TestProject::new();
    project.write_compose(TWO_SERVICES);
    project
        .command()
        .args(["--service", "worker"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unknown service: worker"));
}

#[cfg(unix)]
mod with_fake_engine {
    use super::*;

    #[test]
    fn test_two_services_built() {
        let project = TestProject::new();
        project.install_fake_engine();
        project.write_compose(TWO_SERVICES);

        project
            .command()
            .assert()
            .success()
            .stdout(predicate::str::contains("Built: 2"))
            .stderr(predicate::str::contains("[web] INFO step done"));

        let invocations = project.invocations();
        assert_eq!(invocations.len(), 2);
        for invocation in &invocations {
            assert!(invocation.starts_with("run --network=host --rm"));
            assert!(invocation.contains("--no-push"));
        }
        let web_context = format!("{}/web:/workspace", project.path().display());
        assert!(invocations.iter().any(|i| i.contains(&web_context)));
    }

    #[test]
    fn test_duplicate_images_abort_before_any_build() {
        let project = TestProject::new();
        project.install_fake_engine();
        project.write_compose(
            r#"
services:
  a:
    image: "org/x:latest"
  b:
    image: "org/x:latest"
  c:
    image: "org/c:latest"
    build: .
"#,
        );

        project
            .command()
            .assert()
            .code(1)
            .stderr(predicate::str::contains(
                "Error: Image name org/x:latest is used 2 times",
            ));
        assert!(project.invocations().is_empty());
    }

    #[test]
    fn test_build_arg_resolved_from_environment() {
        let project = TestProject::new();
        project.install_fake_engine();
        project.write_compose(
            r#"
services:
  app:
    image: org/app
    build:
      context: .
      args:
        TAG: "1.0"
        BASE: alpine
"#,
        );
        project.write_file(".env", "BASE=debian\nTAG=from-dotenv\n");

        project.command().env("TAG", "2.0").assert().success();

        let invocations = project.invocations();
        assert_eq!(invocations.len(), 1);
        assert!(invocations[0].contains("--build-arg TAG=2.0"));
        assert!(invocations[0].contains("--build-arg BASE=debian"));
    }

    #[test]
    fn test_failed_build_does_not_stop_others() {
        let project = TestProject::new();
        project.install_fake_engine();
        project.write_compose(TWO_SERVICES);

        project
            .command()
            .env("FAKE_ENGINE_FAIL", "/api:/workspace")
            .assert()
            .code(1)
            .stdout(predicate::str::contains("Built: 1"))
            .stdout(predicate::str::contains("Failed: 1"))
            .stdout(predicate::str::contains("simulated failure"));

        assert_eq!(project.invocations().len(), 2);
    }

    #[test]
    fn test_sequential_fail_fast() {
        let project = TestProject::new();
        project.install_fake_engine();
        project.write_compose(
            r#"
services:
  one: { image: org/one, build: ./one }
  two: { image: org/two, build: ./two }
  three: { image: org/three, build: ./three }
"#,
        );

        project
            .command()
            .arg("--sequential")
            .env("FAKE_ENGINE_FAIL", "/one:/workspace")
            .assert()
            .failure()
            .stdout(predicate::str::contains("Not started: 2"));

        assert_eq!(project.invocations().len(), 1);
    }

    #[test]
    fn test_push_with_failed_mirror_still_succeeds() {
        let project = TestProject::new();
        project.install_fake_engine();
        project.write_compose(
            r#"
services:
  web:
    image: org/web:latest
    build: ./web
    x-mirrors:
      - registry2.example/org/web:latest
"#,
        );

        project
            .command()
            .arg("--push")
            .env("FAKE_ENGINE_FAIL", "docker://registry2.example")
            .assert()
            .success()
            .stdout(predicate::str::contains("Mirror failures: 1"));

        let invocations = project.invocations();
        assert_eq!(invocations.len(), 2);
        assert!(invocations[0].contains("--destination org/web:latest"));
        assert!(invocations[1].contains("copy --all docker://org/web:latest"));
    }

    #[test]
    fn test_dry_run_skips_push_and_mirrors() {
        let project = TestProject::new();
        project.install_fake_engine();
        project.write_compose(
            r#"
services:
  web:
    image: org/web:latest
    build: ./web
    x-mirrors: [registry2.example/org/web:latest]
"#,
        );

        project
            .command()
            .args(["--deploy", "--dry"])
            .assert()
            .success();

        let invocations = project.invocations();
        assert_eq!(invocations.len(), 1);
        assert!(invocations[0].contains("--no-push"));
    }

    #[test]
    fn test_service_filter() {
        let project = TestProject::new();
        project.install_fake_engine();
        project.write_compose(TWO_SERVICES);

        project
            .command()
            .args(["--service", "api", "--engine", "docker"])
            .assert()
            .success()
            .stdout(predicate::str::contains("web skipped: not selected"));

        let invocations = project.invocations();
        assert_eq!(invocations.len(), 1);
        assert!(invocations[0].contains("/api:/workspace"));
    }

    #[test]
    fn test_summary_follows_manifest_order() {
        let project = TestProject::new();
        project.install_fake_engine();
        project.write_compose(
            r#"
services:
  web: { image: org/web, build: ./web }
  db:
    image: postgres:16
  api: { image: org/api, build: ./api }
"#,
        );

        let output = project.command().output().unwrap();
        assert!(output.status.success());

        let stdout = String::from_utf8_lossy(&output.stdout);
        let web = stdout.find("✓ web").unwrap();
        let db = stdout.find("- db skipped").unwrap();
        let api = stdout.find("✓ api").unwrap();
        assert!(web < db && db < api, "{}", stdout);
    }

    #[test]
    fn test_compose_file_from_environment() {
        let project = TestProject::new();
        project.install_fake_engine();
        project.write_file("stack.yml", TWO_SERVICES);

        project
            .command()
            .env("COMPOSE_FILE", project.path().join("stack.yml"))
            .assert()
            .success();

        assert_eq!(project.invocations().len(), 2);
    }
}
