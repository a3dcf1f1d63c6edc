//! Tests for lifecycle coordination.

use super::*;
use crate::arch::{ArchitectureSet, NamingRules};
use crate::guard::DEFAULT_PACKAGE_TOKEN;
use crate::test_utils::{ExpectedCall, FakeCheckout, StubExecutor};
use camino::{Utf8Path, Utf8PathBuf};
use mockall::Sequence;
use rstest::{fixture, rstest};
use std::fs;
use tempfile::TempDir;

struct Checkout {
    _temp: TempDir,
    fake: FakeCheckout,
    stager: Stager,
}

impl Checkout {
    fn staging_root(&self) -> &Utf8Path {
        self.stager.staging_root().path()
    }

    fn package_dir(&self) -> Utf8PathBuf {
        self.fake.layout.repo_root.join("panda/pypanda")
    }
}

#[fixture]
fn checkout() -> Checkout {
    let temp = tempfile::Builder::new()
        .prefix("lifecycle-")
        .tempdir()
        .expect("temp dir");
    let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("utf8");
    let set = ArchitectureSet::from_names(["arm", "i386"]).expect("valid set");
    let fake = FakeCheckout::create(&root, &set, &NamingRules::default()).expect("fake checkout");
    let stager = Stager::new(
        fake.layout.clone(),
        NamingRules::default(),
        set,
        DEFAULT_PACKAGE_TOKEN,
    );
    Checkout {
        _temp: temp,
        fake,
        stager,
    }
}

fn invocation(argv: &[&str], cwd: &Utf8Path) -> Invocation {
    let argv: Vec<String> = argv.iter().map(|s| (*s).to_owned()).collect();
    Invocation::from_argv(&argv, cwd).expect("argv")
}

#[rstest]
fn distribution_generates_then_stages_then_installs(checkout: Checkout) {
    let mut seq = Sequence::new();
    let mut codegen = MockCodeGenerator::new();
    codegen
        .expect_generate()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| Ok(()));
    let mut framework = MockInstallerFramework::new();
    let staging_root = checkout.staging_root().to_owned();
    framework
        .expect_install()
        .withf(|mode| *mode == InstallMode::Distribution)
        .times(1)
        .in_sequence(&mut seq)
        .returning(move |_| {
            assert!(staging_root.join("arm-softmmu").is_dir(), "staged before install");
            Ok(())
        });

    let outcome = Lifecycle::new(&checkout.stager, &framework)
        .with_codegen(&codegen)
        .run(InstallMode::Distribution)
        .expect("distribution install");

    assert_eq!(outcome.mode, InstallMode::Distribution);
    let report = outcome.staged.expect("staging report");
    assert_eq!(report.architectures.len(), 2);
    assert!(!outcome.removed_stale);
}

#[rstest]
fn failed_staging_never_reaches_the_framework(checkout: Checkout) {
    checkout
        .fake
        .remove_build_output("arm-softmmu/libpanda-arm.so")
        .expect("remove library");
    let mut framework = MockInstallerFramework::new();
    framework.expect_install().never();

    let err = Lifecycle::new(&checkout.stager, &framework)
        .run(InstallMode::Distribution)
        .expect_err("missing artefact");

    assert!(matches!(err, InstallerError::MissingArtefact { .. }));
}

#[rstest]
fn failed_codegen_stops_before_staging(checkout: Checkout) {
    let mut codegen = MockCodeGenerator::new();
    codegen.expect_generate().times(1).returning(|| {
        Err(InstallerError::CodegenFailed {
            command: "python3 utils/create_panda_datatypes.py".to_owned(),
            message: "ModuleNotFoundError: cffi".to_owned(),
        })
    });
    let mut framework = MockInstallerFramework::new();
    framework.expect_install().never();

    let err = Lifecycle::new(&checkout.stager, &framework)
        .with_codegen(&codegen)
        .run(InstallMode::Distribution)
        .expect_err("codegen failure");

    assert!(matches!(err, InstallerError::CodegenFailed { .. }));
    assert!(!checkout.staging_root().exists());
}

#[rstest]
fn development_removes_stale_bundle_and_delegates(checkout: Checkout) {
    checkout.stager.stage().expect("earlier distribution staging");
    let mut framework = MockInstallerFramework::new();
    framework
        .expect_install()
        .withf(|mode| *mode == InstallMode::Development)
        .times(1)
        .returning(|_| Ok(()));

    let outcome = Lifecycle::new(&checkout.stager, &framework)
        .run(InstallMode::Development)
        .expect("development install");

    assert!(outcome.removed_stale);
    assert!(outcome.staged.is_none());
    assert!(!checkout.staging_root().exists());
}

#[rstest]
fn development_without_bundle_still_delegates(checkout: Checkout) {
    let mut framework = MockInstallerFramework::new();
    framework.expect_install().times(1).returning(|_| Ok(()));

    let outcome = Lifecycle::new(&checkout.stager, &framework)
        .run(InstallMode::Development)
        .expect("development install");

    assert!(!outcome.removed_stale);
    assert!(!checkout.staging_root().exists());
}

#[rstest]
fn development_refuses_unowned_directory(checkout: Checkout) {
    fs::create_dir_all(checkout.staging_root()).expect("mkdir");
    fs::write(checkout.staging_root().join("notes.txt"), b"keep").expect("write");
    let mut framework = MockInstallerFramework::new();
    framework.expect_install().never();

    let err = Lifecycle::new(&checkout.stager, &framework)
        .run(InstallMode::Development)
        .expect_err("unowned staging root");

    assert!(matches!(err, InstallerError::UnownedStagingRoot { .. }));
    assert!(checkout.staging_root().join("notes.txt").is_file());
}

#[rstest]
fn command_backed_collaborators_run_in_package_dir(checkout: Checkout) {
    let package_dir = checkout.package_dir();
    let executor = StubExecutor::new(vec![
        ExpectedCall::succeeding("python3", &["utils/create_panda_datatypes.py"]),
        ExpectedCall::succeeding("python3", &["-m", "pip", "install", "."]),
    ]);
    let codegen = CommandCodeGenerator::new(
        &executor,
        invocation(&["python3", "utils/create_panda_datatypes.py"], &package_dir),
    );
    let framework = CommandFramework::new(
        &executor,
        invocation(&["python3", "-m", "pip", "install", "."], &package_dir),
        invocation(&["python3", "-m", "pip", "install", "-e", "."], &package_dir),
    );

    Lifecycle::new(&checkout.stager, &framework)
        .with_codegen(&codegen)
        .run(InstallMode::Distribution)
        .expect("install");

    assert!(executor.is_finished());
    assert!(executor.received().iter().all(|inv| inv.cwd == package_dir));
}

#[rstest]
#[case::distribution(InstallMode::Distribution, &["-m", "pip", "install", "."])]
#[case::development(InstallMode::Development, &["-m", "pip", "install", "-e", "."])]
fn framework_picks_command_for_mode(#[case] mode: InstallMode, #[case] args: &[&'static str]) {
    let executor = StubExecutor::new(vec![ExpectedCall::succeeding("python3", args)]);
    let cwd = Utf8Path::new("/src/panda/panda/pypanda");
    let framework = CommandFramework::new(
        &executor,
        invocation(&["python3", "-m", "pip", "install", "."], cwd),
        invocation(&["python3", "-m", "pip", "install", "-e", "."], cwd),
    );

    framework.install(mode).expect("install");

    assert!(executor.is_finished());
}

#[test]
fn framework_failure_carries_mode_and_stderr() {
    let executor = StubExecutor::new(vec![ExpectedCall::failing(
        "python3",
        &["-m", "pip", "install", "-e", "."],
        "ERROR: File \"setup.py\" not found.\n",
    )]);
    let cwd = Utf8Path::new("/src/panda/panda/pypanda");
    let framework = CommandFramework::new(
        &executor,
        invocation(&["python3", "-m", "pip", "install", "."], cwd),
        invocation(&["python3", "-m", "pip", "install", "-e", "."], cwd),
    );

    let err = framework
        .install(InstallMode::Development)
        .expect_err("framework failure");

    assert_eq!(
        err.to_string(),
        "development install (python3 -m pip install -e .) failed: ERROR: File \"setup.py\" not found."
    );
}

#[test]
fn codegen_failure_names_the_command() {
    let executor = StubExecutor::new(vec![ExpectedCall::failing(
        "python3",
        &["utils/create_panda_datatypes.py"],
        "",
    )]);
    let codegen = CommandCodeGenerator::new(
        &executor,
        invocation(&["python3", "utils/create_panda_datatypes.py"], Utf8Path::new("/src")),
    );

    let err = codegen.generate().expect_err("codegen failure");

    assert!(matches!(
        err,
        InstallerError::CodegenFailed { ref command, ref message }
            if command == "python3 utils/create_panda_datatypes.py" && message.starts_with("exited with")
    ));
}

#[test]
fn install_mode_display() {
    assert_eq!(InstallMode::Distribution.to_string(), "distribution");
    assert_eq!(InstallMode::Development.to_string(), "development");
}
