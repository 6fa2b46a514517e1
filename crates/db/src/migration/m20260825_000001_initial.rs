//! Initial database migration.
//!
//! Creates the enums, directory tables, leave configuration, and the
//! applications ledger.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: DIRECTORY
        // ============================================================
        db.execute_unprepared(USERS_SQL).await?;
        db.execute_unprepared(DELEGATION_GROUPS_SQL).await?;
        db.execute_unprepared(DEPARTMENT_GROUPS_SQL).await?;

        // ============================================================
        // PART 3: LEAVE CONFIGURATION
        // ============================================================
        db.execute_unprepared(LEAVE_TYPES_SQL).await?;
        db.execute_unprepared(LEAVE_ENTITLEMENTS_SQL).await?;

        // ============================================================
        // PART 4: APPLICATIONS LEDGER
        // ============================================================
        db.execute_unprepared(APPLICATIONS_SQL).await?;

        // ============================================================
        // PART 5: SEED DATA
        // ============================================================
        db.execute_unprepared(SEED_LEAVE_TYPES_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
-- Request lifecycle
CREATE TYPE application_status AS ENUM (
    'pending',
    'approved',
    'rejected',
    'cancelled'
);

-- Cached current stage of the approval chain
CREATE TYPE approval_stage AS ENUM (
    'checker',
    'approver_1',
    'approver_2',
    'approver_3',
    'completed'
);

-- Request kinds sharing the one ledger table
CREATE TYPE request_kind AS ENUM (
    'leave',
    'overtime',
    'outdoor_work'
);

-- Admission path
CREATE TYPE flow_type AS ENUM (
    'e_flow',
    'paper_flow'
);

-- Half-day marker on a range edge
CREATE TYPE day_session AS ENUM (
    'am',
    'pm'
);

-- Directory roles
CREATE TYPE user_role AS ENUM (
    'employee',
    'hr',
    'admin'
);
";

const USERS_SQL: &str = r"
CREATE TABLE users (
    id BIGSERIAL PRIMARY KEY,
    email VARCHAR(255) NOT NULL UNIQUE,
    name VARCHAR(255) NOT NULL,
    role user_role NOT NULL DEFAULT 'employee',
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_users_role ON users(role) WHERE is_active;
";

const DELEGATION_GROUPS_SQL: &str = r"
CREATE TABLE delegation_groups (
    id BIGSERIAL PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Position orders members; the first becomes the stage's snapshot assignee
CREATE TABLE delegation_group_members (
    id BIGSERIAL PRIMARY KEY,
    delegation_group_id BIGINT NOT NULL REFERENCES delegation_groups(id) ON DELETE CASCADE,
    user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    position INTEGER NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_delegation_member UNIQUE (delegation_group_id, user_id)
);

CREATE INDEX idx_delegation_members_group ON delegation_group_members(delegation_group_id, position);
CREATE INDEX idx_delegation_members_user ON delegation_group_members(user_id);
";

const DEPARTMENT_GROUPS_SQL: &str = r"
-- Up to four delegation groups, one per approval stage; NULL shortens the chain
CREATE TABLE department_groups (
    id BIGSERIAL PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    checker_group_id BIGINT REFERENCES delegation_groups(id),
    approver_1_group_id BIGINT REFERENCES delegation_groups(id),
    approver_2_group_id BIGINT REFERENCES delegation_groups(id),
    approver_3_group_id BIGINT REFERENCES delegation_groups(id),
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE department_group_members (
    id BIGSERIAL PRIMARY KEY,
    department_group_id BIGINT NOT NULL REFERENCES department_groups(id) ON DELETE CASCADE,
    user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_department_member UNIQUE (user_id)
);

CREATE INDEX idx_department_members_group ON department_group_members(department_group_id);
";

const LEAVE_TYPES_SQL: &str = r"
CREATE TABLE leave_types (
    id BIGSERIAL PRIMARY KEY,
    code VARCHAR(16) NOT NULL UNIQUE,
    name VARCHAR(255) NOT NULL,
    requires_balance BOOLEAN NOT NULL DEFAULT true,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const LEAVE_ENTITLEMENTS_SQL: &str = r"
-- Credit side of the computed balance; a missing row means zero entitlement
CREATE TABLE leave_entitlements (
    id BIGSERIAL PRIMARY KEY,
    user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    leave_type_id BIGINT NOT NULL REFERENCES leave_types(id) ON DELETE CASCADE,
    year INTEGER NOT NULL,
    entitled_days NUMERIC(6,1) NOT NULL CHECK (entitled_days >= 0),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_entitlement UNIQUE (user_id, leave_type_id, year)
);
";

const APPLICATIONS_SQL: &str = r"
-- One row per request of any kind, cancellation requests and reversal rows
-- included. Stage slots are inline; current_approval_stage caches the value
-- derived from them.
CREATE TABLE applications (
    id BIGSERIAL PRIMARY KEY,
    user_id BIGINT NOT NULL REFERENCES users(id),
    request_kind request_kind NOT NULL,
    leave_type_id BIGINT REFERENCES leave_types(id),
    year INTEGER NOT NULL,
    start_date DATE NOT NULL,
    end_date DATE NOT NULL,
    start_session day_session,
    end_session day_session,
    total_days NUMERIC(6,1) NOT NULL,
    reason TEXT,
    status application_status NOT NULL DEFAULT 'pending',
    current_approval_stage approval_stage NOT NULL DEFAULT 'checker',
    flow_type flow_type NOT NULL DEFAULT 'e_flow',
    is_paper_flow BOOLEAN NOT NULL DEFAULT false,

    checker_id BIGINT REFERENCES users(id),
    checker_group_id BIGINT REFERENCES delegation_groups(id),
    checker_at TIMESTAMPTZ,
    checker_remarks TEXT,
    approver_1_id BIGINT REFERENCES users(id),
    approver_1_group_id BIGINT REFERENCES delegation_groups(id),
    approver_1_at TIMESTAMPTZ,
    approver_1_remarks TEXT,
    approver_2_id BIGINT REFERENCES users(id),
    approver_2_group_id BIGINT REFERENCES delegation_groups(id),
    approver_2_at TIMESTAMPTZ,
    approver_2_remarks TEXT,
    approver_3_id BIGINT REFERENCES users(id),
    approver_3_group_id BIGINT REFERENCES delegation_groups(id),
    approver_3_at TIMESTAMPTZ,
    approver_3_remarks TEXT,

    rejected_by_id BIGINT REFERENCES users(id),
    rejected_at TIMESTAMPTZ,
    rejection_reason TEXT,
    cancelled_by_id BIGINT REFERENCES users(id),
    cancelled_at TIMESTAMPTZ,
    cancellation_reason TEXT,

    is_cancellation_request BOOLEAN NOT NULL DEFAULT false,
    original_application_id BIGINT REFERENCES applications(id),
    is_reversal_transaction BOOLEAN NOT NULL DEFAULT false,
    reversal_of_application_id BIGINT REFERENCES applications(id),
    is_reversed BOOLEAN NOT NULL DEFAULT false,
    reversal_completed_at TIMESTAMPTZ,

    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_date_order CHECK (end_date >= start_date),
    CONSTRAINT chk_cancellation_target CHECK (
        NOT is_cancellation_request OR original_application_id IS NOT NULL
    ),
    CONSTRAINT chk_reversal_target CHECK (
        NOT is_reversal_transaction OR reversal_of_application_id IS NOT NULL
    )
);

-- Overlap guard scan: active rows of one user and kind by range
CREATE INDEX idx_applications_overlap
    ON applications(user_id, request_kind, start_date, end_date)
    WHERE status IN ('pending', 'approved');

-- Balance aggregate scan
CREATE INDEX idx_applications_balance
    ON applications(user_id, leave_type_id, year)
    WHERE status = 'approved' AND request_kind = 'leave';

-- Pending-queue listing
CREATE INDEX idx_applications_pending
    ON applications(status, created_at DESC)
    WHERE status = 'pending';

CREATE INDEX idx_applications_original ON applications(original_application_id)
    WHERE original_application_id IS NOT NULL;
CREATE INDEX idx_applications_reversal_of ON applications(reversal_of_application_id)
    WHERE reversal_of_application_id IS NOT NULL;
";

const SEED_LEAVE_TYPES_SQL: &str = r"
INSERT INTO leave_types (code, name, requires_balance) VALUES
    ('AL', 'Annual Leave', true),
    ('SL', 'Sick Leave', true),
    ('UL', 'Unpaid Leave', false);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS applications CASCADE;
DROP TABLE IF EXISTS leave_entitlements CASCADE;
DROP TABLE IF EXISTS leave_types CASCADE;
DROP TABLE IF EXISTS department_group_members CASCADE;
DROP TABLE IF EXISTS department_groups CASCADE;
DROP TABLE IF EXISTS delegation_group_members CASCADE;
DROP TABLE IF EXISTS delegation_groups CASCADE;
DROP TABLE IF EXISTS users CASCADE;

DROP TYPE IF EXISTS user_role;
DROP TYPE IF EXISTS day_session;
DROP TYPE IF EXISTS flow_type;
DROP TYPE IF EXISTS request_kind;
DROP TYPE IF EXISTS approval_stage;
DROP TYPE IF EXISTS application_status;
";
