//! Database seeder for Kintai development and testing.
//!
//! Seeds users, delegation groups, a department approval chain, and leave
//! entitlements for local development and testing purposes.
//!
//! Usage: cargo run --bin seeder

use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use std::str::FromStr;

use kintai_db::entities::{
    delegation_group_members, delegation_groups, department_group_members, department_groups,
    leave_entitlements, leave_types, sea_orm_active_enums::UserRole, users,
};

/// Seed users: (id, email, name, role).
const SEED_USERS: &[(i64, &str, &str, UserRole)] = &[
    (1, "admin@kintai.dev", "Site Admin", UserRole::Admin),
    (2, "hr@kintai.dev", "HR Officer", UserRole::Hr),
    (3, "lead.a@kintai.dev", "Team Lead A", UserRole::Employee),
    (4, "lead.b@kintai.dev", "Team Lead B", UserRole::Employee),
    (5, "section@kintai.dev", "Section Manager", UserRole::Employee),
    (6, "dept@kintai.dev", "Department Manager", UserRole::Employee),
    (7, "director@kintai.dev", "Director", UserRole::Employee),
    (10, "alice@kintai.dev", "Alice Employee", UserRole::Employee),
    (11, "bob@kintai.dev", "Bob Employee", UserRole::Employee),
    (12, "carol@kintai.dev", "Carol Employee", UserRole::Employee),
];

/// Delegation groups: (id, name, ordered member ids).
const SEED_DELEGATION_GROUPS: &[(i64, &str, &[i64])] = &[
    (1, "Team Leads", &[3, 4]),
    (2, "Section Managers", &[5]),
    (3, "Department Managers", &[6]),
    (4, "Directors", &[7]),
];

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = kintai_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    println!("Seeding users...");
    seed_users(&db).await;

    println!("Seeding delegation groups...");
    seed_delegation_groups(&db).await;

    println!("Seeding department chains...");
    seed_department_chains(&db).await;

    println!("Seeding leave entitlements...");
    seed_entitlements(&db).await;

    println!("Seeding complete!");
}

/// Seeds the development user directory.
async fn seed_users(db: &DatabaseConnection) {
    let mut inserted = 0;
    for &(id, email, name, role) in SEED_USERS {
        if users::Entity::find_by_id(id).one(db).await.ok().flatten().is_some() {
            continue;
        }

        let user = users::ActiveModel {
            id: Set(id),
            email: Set(email.to_string()),
            name: Set(name.to_string()),
            role: Set(role),
            is_active: Set(true),
            created_at: Set(Utc::now().into()),
            updated_at: Set(Utc::now().into()),
        };

        if let Err(e) = user.insert(db).await {
            eprintln!("Failed to insert user {email}: {e}");
        } else {
            inserted += 1;
        }
    }
    println!("  Inserted {inserted} users");
}

/// Seeds the delegation groups with ordered members.
async fn seed_delegation_groups(db: &DatabaseConnection) {
    let mut inserted = 0;
    for &(id, name, members) in SEED_DELEGATION_GROUPS {
        if delegation_groups::Entity::find_by_id(id)
            .one(db)
            .await
            .ok()
            .flatten()
            .is_none()
        {
            let group = delegation_groups::ActiveModel {
                id: Set(id),
                name: Set(name.to_string()),
                is_active: Set(true),
                created_at: Set(Utc::now().into()),
                updated_at: Set(Utc::now().into()),
            };

            if let Err(e) = group.insert(db).await {
                eprintln!("Failed to insert delegation group {name}: {e}");
                continue;
            }
            inserted += 1;
        }

        for (position, &user_id) in members.iter().enumerate() {
            #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            let member = delegation_group_members::ActiveModel {
                delegation_group_id: Set(id),
                user_id: Set(user_id),
                position: Set(position as i32 + 1),
                created_at: Set(Utc::now().into()),
                ..Default::default()
            };

            if let Err(e) = member.insert(db).await {
                if !e.to_string().contains("duplicate key") {
                    eprintln!("Failed to insert member {user_id} of group {name}: {e}");
                }
            }
        }
    }
    println!("  Inserted {inserted} delegation groups");
}

/// Seeds two department chains: a full four-stage chain and a short one.
async fn seed_department_chains(db: &DatabaseConnection) {
    let chains: &[(i64, &str, [Option<i64>; 4], &[i64])] = &[
        (
            1,
            "Engineering",
            [Some(1), Some(2), Some(3), Some(4)],
            &[10, 11],
        ),
        (2, "Sales", [Some(1), Some(2), None, None], &[12]),
    ];

    let mut inserted = 0;
    for &(id, name, slots, members) in chains {
        if department_groups::Entity::find_by_id(id)
            .one(db)
            .await
            .ok()
            .flatten()
            .is_none()
        {
            let department = department_groups::ActiveModel {
                id: Set(id),
                name: Set(name.to_string()),
                checker_group_id: Set(slots[0]),
                approver_1_group_id: Set(slots[1]),
                approver_2_group_id: Set(slots[2]),
                approver_3_group_id: Set(slots[3]),
                is_active: Set(true),
                created_at: Set(Utc::now().into()),
                updated_at: Set(Utc::now().into()),
            };

            if let Err(e) = department.insert(db).await {
                eprintln!("Failed to insert department {name}: {e}");
                continue;
            }
            inserted += 1;
        }

        for &user_id in members {
            let member = department_group_members::ActiveModel {
                department_group_id: Set(id),
                user_id: Set(user_id),
                created_at: Set(Utc::now().into()),
                ..Default::default()
            };

            if let Err(e) = member.insert(db).await {
                if !e.to_string().contains("duplicate key") {
                    eprintln!("Failed to insert member {user_id} of department {name}: {e}");
                }
            }
        }
    }
    println!("  Inserted {inserted} department chains");
}

/// Seeds current-year entitlements for every seeded user against the leave
/// types that carry a balance.
async fn seed_entitlements(db: &DatabaseConnection) {
    let year = Utc::now().date_naive().year();

    // Annual leave 12 days, sick leave 10 days. Half-day grain.
    let scopes = [("AL", "12.0"), ("SL", "10.0")];

    let mut inserted = 0;
    for (code, days) in scopes {
        let Some(leave_type) = leave_types::Entity::find()
            .filter(leave_types::Column::Code.eq(code))
            .one(db)
            .await
            .ok()
            .flatten()
        else {
            eprintln!("Leave type {code} not found; run the migrator first");
            continue;
        };

        let entitled_days = Decimal::from_str(days).expect("seed entitlement is a valid decimal");

        for &(user_id, _, _, _) in SEED_USERS {
            let entitlement = leave_entitlements::ActiveModel {
                user_id: Set(user_id),
                leave_type_id: Set(leave_type.id),
                year: Set(year),
                entitled_days: Set(entitled_days),
                created_at: Set(Utc::now().into()),
                updated_at: Set(Utc::now().into()),
                ..Default::default()
            };

            if let Err(e) = entitlement.insert(db).await {
                if !e.to_string().contains("duplicate key") {
                    eprintln!("Failed to insert entitlement for user {user_id}: {e}");
                }
            } else {
                inserted += 1;
            }
        }
    }
    println!("  Inserted {inserted} entitlements");
}
