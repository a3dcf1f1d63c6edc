//! Behaviour-driven tests for the distribution and development install
//! lifecycles.
//!
//! The Python installer is replaced by a stub executor that records every
//! invocation, so these scenarios check what would have been run and in
//! which order, together with the resulting staging directory.

mod support;

use panda_installer::test_utils::ExpectedCall;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use support::{RunOutcome, Sandbox, codegen_call};

const INSTALL_ARGS: &[&str] = &["-m", "pip", "install", "."];
const DEVELOP_ARGS: &[&str] = &["-m", "pip", "install", "-e", "."];

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

#[derive(Default)]
struct LifecycleWorld {
    sandbox: Option<Sandbox>,
    framework_failure: Option<String>,
    outcome: Option<RunOutcome>,
}

impl LifecycleWorld {
    fn sandbox(&self) -> &Sandbox {
        self.sandbox.as_ref().expect("sandbox set")
    }

    fn outcome(&self) -> &RunOutcome {
        self.outcome.as_ref().expect("a command has run")
    }

    fn framework_call(&self, args: &[&'static str]) -> ExpectedCall {
        match &self.framework_failure {
            Some(stderr) => ExpectedCall::failing("python3", args, stderr),
            None => ExpectedCall::succeeding("python3", args),
        }
    }
}

#[fixture]
fn world() -> LifecycleWorld {
    LifecycleWorld::default()
}

// ---------------------------------------------------------------------------
// Step definitions
// ---------------------------------------------------------------------------

#[given("a PANDA checkout with build outputs for every default architecture")]
fn given_checkout(world: &mut LifecycleWorld) {
    world.sandbox = Some(Sandbox::new());
}

#[given("the build output \"{relative}\" is missing")]
fn given_missing_output(world: &mut LifecycleWorld, relative: String) {
    world.sandbox().remove_build_output(&relative);
}

#[given("the artefacts have been staged")]
fn given_staged(world: &mut LifecycleWorld) {
    let outcome = world.sandbox().run(&["stage"], Vec::new());
    assert!(outcome.result.is_ok(), "staging failed: {:?}", outcome.result);
}

#[given("the installer framework fails with \"{stderr}\"")]
fn given_framework_fails(world: &mut LifecycleWorld, stderr: String) {
    world.framework_failure = Some(stderr);
}

#[when("a distribution install runs")]
fn when_distribution_install(world: &mut LifecycleWorld) {
    let expected = vec![codegen_call(), world.framework_call(INSTALL_ARGS)];
    let outcome = world.sandbox().run(&["install"], expected);
    world.outcome = Some(outcome);
}

#[when("a development install runs")]
fn when_development_install(world: &mut LifecycleWorld) {
    let expected = vec![codegen_call(), world.framework_call(DEVELOP_ARGS)];
    let outcome = world.sandbox().run(&["develop"], expected);
    world.outcome = Some(outcome);
}

#[then("the run succeeds")]
fn then_succeeds(world: &mut LifecycleWorld) {
    let outcome = world.outcome();
    assert!(outcome.result.is_ok(), "run failed: {:?}", outcome.result);
}

#[then("the run fails naming \"{text}\"")]
fn then_fails_naming(world: &mut LifecycleWorld, text: String) {
    let message = world.outcome().error().to_string();
    assert!(message.contains(&text), "unexpected error: {message}");
}

#[then("code generation ran first")]
fn then_codegen_first(world: &mut LifecycleWorld) {
    let first = world.outcome().received.first().expect("something ran");
    assert_eq!(first.to_string(), "python3 utils/create_panda_datatypes.py");
}

#[then("the framework ran \"{command}\"")]
fn then_framework_ran(world: &mut LifecycleWorld, command: String) {
    let received = &world.outcome().received;
    let last = received.last().expect("something ran");
    assert_eq!(last.to_string(), command);
    assert_eq!(last.cwd, world.sandbox().root().join("panda/pypanda"));
}

#[then("the framework was not invoked")]
fn then_framework_not_invoked(world: &mut LifecycleWorld) {
    let received = &world.outcome().received;
    assert!(
        received.iter().all(|inv| !inv.args.iter().any(|a| a == "pip")),
        "framework ran: {received:?}"
    );
}

#[then("the bundle contains \"{relative}\"")]
fn then_bundle_contains(world: &mut LifecycleWorld, relative: String) {
    let path = world.sandbox().staging_root().join(relative);
    assert!(path.is_file(), "{path} was not staged");
}

#[then("the staging directory is absent")]
fn then_staging_absent(world: &mut LifecycleWorld) {
    assert!(!world.sandbox().staging_root().exists());
}

// ---------------------------------------------------------------------------
// Scenario bindings
// ---------------------------------------------------------------------------

#[scenario(
    path = "tests/features/lifecycle.feature",
    name = "Distribution install stages before delegating"
)]
fn scenario_distribution_install(world: LifecycleWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/lifecycle.feature",
    name = "Failed staging never reaches the framework"
)]
fn scenario_failed_staging(world: LifecycleWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/lifecycle.feature",
    name = "Development install clears a stale bundle"
)]
fn scenario_development_install(world: LifecycleWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/lifecycle.feature",
    name = "Framework failure is reported"
)]
fn scenario_framework_failure(world: LifecycleWorld) {
    let _ = world;
}
