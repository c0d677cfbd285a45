use clap::Parser;
use openshelter::cli::{run_with, Cli};
use openshelter::database::ShelterStore;
use openshelter::testing::MemoryStore;

#[tokio::test]
async fn user_create_then_list() {
    let store = MemoryStore::new();

    let cli = Cli::parse_from([
        "shelterctl",
        "user",
        "create",
        "--email",
        "Lead@Shelter.org",
        "--name",
        "Lead Volunteer",
        "--password",
        "paw-prints-99",
    ]);
    run_with(cli, &store).await.unwrap();

    run_with(Cli::parse_from(["shelterctl", "--json", "user", "list"]), &store)
        .await
        .unwrap();

    let users = store.list_users().await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].email, "lead@shelter.org");
    assert_eq!(users[0].name, "Lead Volunteer");
}

#[test]
fn create_requires_every_flag() {
    let result = Cli::try_parse_from(["shelterctl", "user", "create", "--email", "a@b.org"]);
    assert!(result.is_err());
}
