use rstest::rstest;
use stackvault_sync::redact;
use stackvault_sync::redact::is_sensitive_key;

#[rstest]
#[case("GITHUB_TOKEN", true)]
#[case("api_key", true)]
#[case("ApiKey", true)]
#[case("POSTGRES_PASSWORD", true)]
#[case("CLIENT_SECRET", true)]
#[case("PUBLIC_KEYRING", true)]
#[case("TZ", false)]
#[case("PUID", false)]
#[case("DOMAIN", false)]
fn sensitive_keys(#[case] key: &str, #[case] sensitive: bool) {
    assert_eq!(is_sensitive_key(key), sensitive, "key {key}");
}

#[rstest]
#[case("DB_PASSWORD=hunter2\nPORT=8080", "DB_PASSWORD=XXXXX\nPORT=8080")]
#[case("TOKEN=\n", "TOKEN=XXXXX\n")]
#[case(" secret = spaced \n", " secret =XXXXX\n")]
#[case("PASSWORD\n", "PASSWORD\n")]
#[case("=value\n", "=value\n")]
fn env_content(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(redact(input), expected);
}

#[test]
fn realistic_env_file() {
    let input = "\
# database
POSTGRES_USER=app
POSTGRES_PASSWORD=very-secret
POSTGRES_DB=app

JWT_SECRET=abc==
S3_ACCESS_KEY_ID=AKIA
TZ=Europe/Paris
";
    let expected = "\
# database
POSTGRES_USER=app
POSTGRES_PASSWORD=XXXXX
POSTGRES_DB=app

JWT_SECRET=XXXXX
S3_ACCESS_KEY_ID=XXXXX
TZ=Europe/Paris
";
    assert_eq!(redact(input), expected);
}
