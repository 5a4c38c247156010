//! BDD tests for manifest reference resolution and manifest URLs.

use cpython_installer::config::resolve_manifest_reference;
use cpython_installer::reference::{ReferenceFormatError, RepositoryReference};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

#[derive(Default)]
struct ReferenceWorld {
    override_value: Option<String>,
    result: Option<Result<RepositoryReference, ReferenceFormatError>>,
}

impl ReferenceWorld {
    fn reference(&self) -> &RepositoryReference {
        match self.result.as_ref().expect("reference resolved") {
            Ok(reference) => reference,
            Err(err) => panic!("expected a valid reference, got: {err}"),
        }
    }
}

#[fixture]
fn world() -> ReferenceWorld {
    ReferenceWorld::default()
}

#[given("no manifest reference override")]
fn given_no_override(world: &mut ReferenceWorld) {
    world.override_value = None;
}

#[given("the manifest reference override \"{value}\"")]
fn given_override(world: &mut ReferenceWorld, value: String) {
    world.override_value = Some(value);
}

#[when("the manifest reference is resolved")]
fn when_resolved(world: &mut ReferenceWorld) {
    world.result = Some(resolve_manifest_reference(world.override_value.as_deref()));
}

#[then("the owner is \"{owner}\"")]
fn then_owner(world: &mut ReferenceWorld, owner: String) {
    assert_eq!(world.reference().owner(), owner);
}

#[then("the repository is \"{repo}\"")]
fn then_repo(world: &mut ReferenceWorld, repo: String) {
    assert_eq!(world.reference().repo(), repo);
}

#[then("the ref is \"{git_ref}\"")]
fn then_ref(world: &mut ReferenceWorld, git_ref: String) {
    assert_eq!(world.reference().git_ref(), git_ref);
}

#[then("the manifest URL is \"{url}\"")]
fn then_manifest_url(world: &mut ReferenceWorld, url: String) {
    assert_eq!(world.reference().manifest_raw_url(), url);
}

#[then("resolution fails mentioning \"{text}\"")]
fn then_fails_mentioning(world: &mut ReferenceWorld, text: String) {
    match world.result.as_ref().expect("reference resolved") {
        Ok(reference) => panic!("expected a format error, got {reference}"),
        Err(err) => {
            let message = err.to_string();
            assert!(
                message.contains(&text),
                "expected error to mention '{text}', got: {message}"
            );
        }
    }
}

#[scenario(
    path = "tests/features/manifest_reference.feature",
    name = "Default reference is used without an override"
)]
fn scenario_default_reference(world: ReferenceWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/manifest_reference.feature",
    name = "Blank override falls back to the default"
)]
fn scenario_blank_override(world: ReferenceWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/manifest_reference.feature",
    name = "Override with a slash in the ref"
)]
fn scenario_slash_in_ref(world: ReferenceWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/manifest_reference.feature",
    name = "Ref containing a second at sign is rejected"
)]
fn scenario_second_at_sign(world: ReferenceWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/manifest_reference.feature",
    name = "Repository segment containing a slash is rejected"
)]
fn scenario_slash_in_repo(world: ReferenceWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/manifest_reference.feature",
    name = "Reference without a ref is rejected"
)]
fn scenario_missing_ref(world: ReferenceWorld) {
    let _ = world;
}
