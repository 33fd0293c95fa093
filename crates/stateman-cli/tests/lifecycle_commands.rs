use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const VALID: &str = "@startuml\n[*] --> Idle\nIdle --> Active\nActive --> [*]\n@enduml\n";

fn cli(root: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_stateman"));
    cmd.env_remove("STATEMAN_STRICTNESS")
        .env("STATEMAN_ROOT", root.join("diagrams"));
    cmd
}

fn write_source(temp: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = temp.path().join(name);
    fs::write(&path, content).expect("write source");
    path
}

#[test]
fn create_promote_and_list() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let source = write_source(&temp, "door.puml", VALID);

    cli(temp.path())
        .args(["create", "door", "1.0.0", "--file"])
        .arg(&source)
        .assert()
        .success()
        .stdout(contains(
            "Created diagram 'door-1.0.0' at staging/door-1.0.0/door-1.0.0.puml",
        ));

    cli(temp.path())
        .args(["promote", "door", "1.0.0"])
        .assert()
        .success()
        .stdout(contains("Promoted diagram 'door-1.0.0'"));

    assert!(
        temp.path()
            .join("diagrams/products/door-1.0.0/door-1.0.0.puml")
            .is_file()
    );

    cli(temp.path())
        .args(["list", "--location", "production"])
        .assert()
        .success()
        .stdout(contains("Diagrams in production (1):"))
        .stdout(contains("door-1.0.0"));

    cli(temp.path())
        .arg("list")
        .assert()
        .success()
        .stdout(contains("Diagrams in staging (0):"));
    Ok(())
}

#[test]
fn blocked_promotion_exits_with_data_error() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let source = write_source(&temp, "door.puml", "[*] --> Idle\n");

    cli(temp.path())
        .args(["create", "door", "1.0.0", "--file"])
        .arg(&source)
        .assert()
        .success()
        .stdout(contains("[ERR] MISSING_START"));

    cli(temp.path())
        .args(["promote", "door", "1.0.0"])
        .assert()
        .failure()
        .code(65)
        .stderr(contains("promotion of"))
        .stderr(contains("MISSING_START").and(contains("MISSING_END")));

    assert!(
        temp.path()
            .join("diagrams/staging/door-1.0.0/door-1.0.0.puml")
            .is_file()
    );
    Ok(())
}

#[test]
fn update_show_and_delete() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let source = write_source(&temp, "door.puml", VALID);
    let revised = write_source(
        &temp,
        "revised.puml",
        "@startuml\n!include nested/latch/latch.puml\n[*] --> Closed\n@enduml\n",
    );

    cli(temp.path())
        .args(["create", "door", "1.0.0", "--file"])
        .arg(&source)
        .assert()
        .success();

    cli(temp.path())
        .args(["update", "door", "1.0.0", "--file"])
        .arg(&revised)
        .assert()
        .success()
        .stdout(contains("Updated diagram 'door-1.0.0'"))
        .stdout(contains("[ERR] NESTED_REFERENCE_NOT_FOUND 2:1"));

    cli(temp.path())
        .args(["show", "door", "1.0.0"])
        .assert()
        .success()
        .stdout(contains("References (1):"))
        .stdout(contains("nested nested/latch/latch.puml (line 2)"))
        .stdout(contains("[*] --> Closed"));

    cli(temp.path())
        .args(["--json", "show", "door", "1.0.0"])
        .assert()
        .success()
        .stdout(contains("\"type\":\"shown\""))
        .stdout(contains("\"kind\":\"nested\""));

    cli(temp.path())
        .args(["delete", "door", "1.0.0"])
        .assert()
        .success()
        .stdout(contains("Deleted diagram 'door-1.0.0'"));

    cli(temp.path())
        .args(["show", "door", "1.0.0"])
        .assert()
        .failure()
        .code(65)
        .stderr(contains("diagram not found"));
    Ok(())
}

#[test]
fn duplicate_create_and_bad_identity_are_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let source = write_source(&temp, "door.puml", VALID);

    cli(temp.path())
        .args(["create", "door", "1.0.0", "--file"])
        .arg(&source)
        .assert()
        .success();

    cli(temp.path())
        .args(["create", "door", "1.0.0", "--file"])
        .arg(&source)
        .assert()
        .failure()
        .code(65)
        .stderr(contains("already exists"));

    cli(temp.path())
        .args(["create", "door", "latest", "--file"])
        .arg(&source)
        .assert()
        .failure()
        .code(64)
        .stderr(contains("invalid diagram identity"));
    Ok(())
}

#[test]
fn nested_diagrams_are_addressed_without_version() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let nested = temp.path().join("diagrams/nested/latch");
    fs::create_dir_all(&nested)?;
    fs::write(nested.join("latch.puml"), VALID)?;

    cli(temp.path())
        .args(["show", "latch", "--location", "nested"])
        .assert()
        .success()
        .stdout(contains("Diagram 'latch' (nested) at nested/latch/latch.puml"));

    cli(temp.path())
        .args(["show", "latch", "1.0.0", "--location", "nested"])
        .assert()
        .failure()
        .code(64);

    cli(temp.path())
        .args(["show", "latch", "--location", "attic"])
        .assert()
        .failure()
        .code(64)
        .stderr(contains("unknown location"));
    Ok(())
}

#[test]
fn nested_diagrams_are_created_and_updated_through_the_cli() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let latch = write_source(&temp, "latch.puml", VALID);
    let door = write_source(
        &temp,
        "door.puml",
        "@startuml\n!include nested/latch/latch.puml\n[*] --> Closed\n@enduml\n",
    );

    cli(temp.path())
        .args(["create", "latch", "--location", "nested", "--file"])
        .arg(&latch)
        .assert()
        .success()
        .stdout(contains("Created diagram 'latch' at nested/latch/latch.puml"));

    cli(temp.path())
        .args(["create", "door", "1.0.0", "--file"])
        .arg(&door)
        .assert()
        .success()
        .stdout(contains("NESTED_REFERENCE_NOT_FOUND").not());

    cli(temp.path())
        .args(["update", "latch", "--location", "nested", "--file"])
        .arg(&latch)
        .assert()
        .success()
        .stdout(contains("Updated diagram 'latch'"));

    cli(temp.path())
        .args(["create", "bolt", "1.0.0", "--location", "nested", "--file"])
        .arg(&latch)
        .assert()
        .failure()
        .code(64);

    cli(temp.path())
        .args(["create", "bolt", "1.0.0", "--location", "production", "--file"])
        .arg(&latch)
        .assert()
        .failure()
        .code(64)
        .stderr(contains("promote"));
    Ok(())
}

#[test]
fn missing_subcommand_is_a_usage_error() {
    let temp = TempDir::new().unwrap();
    cli(temp.path()).assert().failure().code(64);
}
