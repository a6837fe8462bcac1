use chrono::{Duration, Utc};

use taskboard::board::{is_overdue, Progress};
use taskboard::db::{Database, MemoryDatabase};
use taskboard::models::{Column, Role, Session, UserProfile};
use taskboard::service::board::{add_task, delete_task, load_board, move_task};
use taskboard::service::invite::{invite_member, load_invitable};
use taskboard::service::projects::create_project;
use taskboard::service::session::{resolve_profile, sign_in, sign_up};
use taskboard::service::task_detail::{add_item, assign_user, load_task_detail, toggle_item, ToggleOutcome};
use taskboard::service::Mutation;

async fn login(db: &MemoryDatabase, email: &str) -> UserProfile {
    sign_up(db, email, "secret1").await.unwrap();
    let session: Session = sign_in(db, email, "secret1").await.unwrap();
    resolve_profile(db, &session).await.unwrap()
}

#[tokio::test]
async fn editor_and_viewer_share_a_board() {
    let db = MemoryDatabase::new();
    let ana = login(&db, "ana@example.com").await;
    let bogdan = login(&db, "bogdan@example.com").await;

    // Ana creates the project and is its editor.
    let project = create_project(&db, ana.user_id, "Launch", "Spring release").await.unwrap();
    let ana_view = load_board(&db, project.id, ana.user_id).await.unwrap();
    assert_eq!(ana_view.role, Role::Editor);
    let ana_actor = ana_view.actor(ana.user_id);

    // Bogdan is invited as a viewer and drops off the invite list.
    let invitable = load_invitable(&db, project.id).await.unwrap();
    assert_eq!(invitable, vec![bogdan.clone()]);
    invite_member(&db, &ana_actor, project.id, bogdan.user_id, Role::Viewer)
        .await
        .unwrap();
    assert!(load_invitable(&db, project.id).await.unwrap().is_empty());

    // Bogdan sees every column, and none of his writes land.
    let bogdan_view = load_board(&db, project.id, bogdan.user_id).await.unwrap();
    assert_eq!(bogdan_view.role, Role::Viewer);
    assert_eq!(bogdan_view.members.len(), 2);
    assert!(bogdan_view.board.is_empty());
    let bogdan_actor = bogdan_view.actor(bogdan.user_id);
    let writes = db.writes();
    assert_eq!(
        add_task(&db, &bogdan_actor, project.id, Column::Todo, "sneaky").await.unwrap(),
        Mutation::ReadOnly
    );
    assert_eq!(db.writes(), writes);

    // Ana adds a task; Bogdan's reload shows it.
    add_task(&db, &ana_actor, project.id, Column::Todo, "Write release notes")
        .await
        .unwrap();
    let bogdan_view = load_board(&db, project.id, bogdan.user_id).await.unwrap();
    let task = bogdan_view.board.column(Column::Todo)[0].task.clone();
    assert_eq!(task.title, "Write release notes");

    let writes = db.writes();
    assert_eq!(move_task(&db, &bogdan_actor, task.id, Column::Done).await.unwrap(), Mutation::ReadOnly);
    assert_eq!(delete_task(&db, &bogdan_actor, task.id).await.unwrap(), Mutation::ReadOnly);
    assert_eq!(
        assign_user(&db, &bogdan_actor, task.id, bogdan.user_id).await.unwrap(),
        Mutation::ReadOnly
    );
    assert_eq!(db.writes(), writes);

    // Ana fills the checklist; an overdue item shows on the card.
    let past = Utc::now() - Duration::days(1);
    add_item(&db, &ana_actor, task.id, "Draft", Some(past)).await.unwrap();
    add_item(&db, &ana_actor, task.id, "Review", None).await.unwrap();
    assign_user(&db, &ana_actor, task.id, bogdan.user_id).await.unwrap();

    let view = load_board(&db, project.id, ana.user_id).await.unwrap();
    let card = &view.board.column(Column::Todo)[0];
    assert_eq!(Progress::of(&card.checklist).label(), "0/2");
    assert!(is_overdue(&card.checklist, Utc::now()));
    assert_eq!(card.assignments[0].assignment.assigned_by, Some(ana.user_id));

    // Completing the first item starts the task and clears the overdue flag.
    let detail = load_task_detail(&db, task.id).await.unwrap();
    let outcome = toggle_item(&db, &ana_actor, &detail.task, &detail.checklist[0], Utc::now())
        .await
        .unwrap();
    assert_eq!(outcome, ToggleOutcome::MovedToInProgress);

    let view = load_board(&db, project.id, bogdan.user_id).await.unwrap();
    assert!(view.board.column(Column::Todo).is_empty());
    let card = &view.board.column(Column::InProgress)[0];
    assert_eq!(card.task.id, task.id);
    assert_eq!(Progress::of(&card.checklist).percent(), 50);
    assert!(!is_overdue(&card.checklist, Utc::now()));
}

#[tokio::test]
async fn demo_accounts_can_sign_in() {
    let db = MemoryDatabase::with_demo_data();
    let session = sign_in(&db, "ana@example.com", taskboard::db::DEMO_PASSWORD).await.unwrap();
    assert_eq!(db.session(), Some(session.clone()));

    let profile = resolve_profile(&db, &session).await.unwrap();
    assert_eq!(profile.initials, "AN");
    assert_eq!(db.list_profiles().await.unwrap().len(), 3);
}
