use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            email       TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            role        TEXT NOT NULL CHECK (role IN ('admin', 'user')),
            created_at  TEXT NOT NULL,
            is_active   INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS deposits (
            id              TEXT PRIMARY KEY,
            user_id         TEXT NOT NULL REFERENCES users(id),
            amount          TEXT NOT NULL,
            proof_url       TEXT NOT NULL,
            status          TEXT NOT NULL
                            CHECK (status IN ('pending', 'approved', 'rejected', 'withdrawn')),
            submitted_at    TEXT NOT NULL,
            approved_at     TEXT,
            approved_by     TEXT,
            maturity_date   TEXT,
            interest_rate   TEXT NOT NULL,
            current_balance TEXT NOT NULL
        );

        -- At most one pending or approved deposit per user
        CREATE UNIQUE INDEX IF NOT EXISTS idx_deposits_one_active
            ON deposits(user_id) WHERE status IN ('pending', 'approved');

        CREATE INDEX IF NOT EXISTS idx_deposits_submitted
            ON deposits(submitted_at);

        CREATE TABLE IF NOT EXISTS transactions (
            id              TEXT PRIMARY KEY,
            user_id         TEXT NOT NULL REFERENCES users(id),
            deposit_id      TEXT REFERENCES deposits(id),
            kind            TEXT NOT NULL
                            CHECK (kind IN ('deposit', 'withdrawal', 'interest_accrual')),
            amount          TEXT NOT NULL,
            balance_after   TEXT NOT NULL,
            timestamp       TEXT NOT NULL,
            description     TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_transactions_user
            ON transactions(user_id, timestamp);

        -- The ledger is append-only
        CREATE TRIGGER IF NOT EXISTS transactions_no_update
            BEFORE UPDATE ON transactions
            BEGIN SELECT RAISE(ABORT, 'transactions are append-only'); END;

        CREATE TRIGGER IF NOT EXISTS transactions_no_delete
            BEFORE DELETE ON transactions
            BEGIN SELECT RAISE(ABORT, 'transactions are append-only'); END;
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
