//! Fixture-driven attestation smoke test.

use resethiq_attest::{attest_file, verify_bundle};
use resethiq_testkit::TestFixture;

#[test]
fn fixture_workspace_attests_and_verifies() {
    let fixture = TestFixture::new();
    let data = TestFixture::patterned_bytes(16 * 1024, 0x0ddba11);
    let artifact = fixture.write_artifact("rows.bin", &data);

    let outcome = attest_file(
        &artifact,
        &fixture.attest_options(2048),
        TestFixture::fixed_env(),
    )
    .unwrap();
    assert_eq!(outcome.attestation.claims.merkle.leaf_count, 8);
    assert_eq!(
        outcome.attestation.manifest.environment,
        TestFixture::fixed_env()
    );

    let report = verify_bundle(&outcome.attestation, &artifact).unwrap();
    assert!(report.ok, "checks: {:?}", report.checks);
}
