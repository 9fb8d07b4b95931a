//! Demo data for local runs and integration tests.
//!
//! Expects a freshly migrated database where the `admin` user holds id 1:
//! the demo users receive ids 2 to 6 and the links reference them by id.
//! Tokens are fixed fixtures so that `/p2z68d` always resolves to
//! `https://ya.ru`. They are not outputs of the configured token generator
//! and `admin token decode` does not recognise them; redirects look tokens up
//! in `shortlinks` and never decode them.

use sqlx::PgPool;

const DEMO_DATA: &str = r#"
INSERT INTO users (username, password, first_name, last_name, email, phone, user_status)
VALUES
    ('test', crypt('test', gen_salt('bf', 8)), 'Pavel', 'Tsypyshev', 'ptsypyshev@example.loc', '222', TRUE),
    ('user', crypt('pass', gen_salt('bf', 8)), 'Vasiliy', 'Pupkin', 'vpupkin@example.loc', '333', FALSE),
    ('iivanov', crypt('ivantest', gen_salt('bf', 8)), 'Ivan', 'Ivanov', 'iivanov@example.loc', '444', TRUE),
    ('ppetrov', crypt('petrtest', gen_salt('bf', 8)), 'Petr', 'Petrov', 'ppetrov@example.loc', '555', TRUE),
    ('ssidorov', crypt('sidrtest', gen_salt('bf', 8)), 'Sidor', 'Sidorov', 'ssidorov@example.loc', '666', TRUE);

INSERT INTO links (long_link, click_counter, owner_id, is_active)
VALUES
    ('https://ya.ru', 100, 2, TRUE),
    ('https://mail.ru', 33, 3, TRUE),
    ('https://gb.ru', 1, 4, TRUE),
    ('https://google.com', 60, 5, TRUE),
    ('https://oracle.com', 5, 6, FALSE),
    ('https://aws.com', 18, 6, TRUE),
    ('https://reg.ru', 7, 5, TRUE),
    ('https://timeweb.ru', 23, 4, TRUE),
    ('https://ozon.ru', 44, 3, TRUE),
    ('https://stackoverflow.com', 58, 2, TRUE);

INSERT INTO shortlinks (token, long_link_id)
VALUES
    ('p2z68d', 1),
    ('08ky2q', 2),
    ('429785', 3),
    ('z86w2k', 4),
    ('l8wxrd', 5),
    ('y2ld8p', 6),
    ('wrvdr9', 7),
    ('q85w8m', 8),
    ('6rn32e', 9),
    ('yr7grg', 10);
"#;

/// Inserts the demo users, links and short links.
///
/// # Errors
///
/// Fails if any demo row already exists (the usernames and tokens are unique).
pub async fn seed_demo_data(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(DEMO_DATA).execute(pool).await?;
    tracing::info!("Demo data inserted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::token_generator::{DEFAULT_MIN_LENGTH, TokenGenerator};

    const FIXTURE_TOKENS: [&str; 10] = [
        "p2z68d", "08ky2q", "429785", "z86w2k", "l8wxrd", "y2ld8p", "wrvdr9", "q85w8m",
        "6rn32e", "yr7grg",
    ];

    #[test]
    fn test_fixture_tokens_are_in_demo_data() {
        for token in FIXTURE_TOKENS {
            assert!(DEMO_DATA.contains(&format!("('{token}', ")));
        }
    }

    #[test]
    fn test_generated_tokens_never_hit_fixtures() {
        for salt in ["shortlink", "test-salt"] {
            let tokens = TokenGenerator::with_default_alphabet(salt, DEFAULT_MIN_LENGTH).unwrap();

            for id in 1..=20_000 {
                assert!(!FIXTURE_TOKENS.contains(&tokens.encode(id).as_str()));
            }
            for token in FIXTURE_TOKENS {
                assert_eq!(tokens.decode(token), None);
            }
        }
    }
}
