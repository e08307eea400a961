mod common;

#[cfg(test)]
mod tests {
    use crate::common::{RecordingExecutor, SqliteExecutor, init_logs};
    use indoc::indoc;
    use rowbind::{
        Config, Entity, MappingError, Mapper, Model, Opt, Registry, args, is_concurrency_update,
    };
    use std::sync::Arc;
    use time::{PrimitiveDateTime, macros::datetime};

    #[derive(Default, Debug, Clone, PartialEq, Entity)]
    pub struct User {
        #[rowbind(orm = "id,primary,autoincrement")]
        pub id: i64,
        #[rowbind(orm = "name")]
        pub name: String,
        #[rowbind(orm = "age")]
        pub age: i32,
        #[rowbind(orm = "active")]
        pub active: bool,
        #[rowbind(orm = "created")]
        pub created: Option<PrimitiveDateTime>,
    }

    #[derive(Default, Debug, Clone, PartialEq, Entity)]
    pub struct Account {
        #[rowbind(orm = "id,primary,autoincrement")]
        pub id: i64,
        #[rowbind(orm = "owner")]
        pub owner: String,
        #[rowbind(orm = "balance")]
        pub balance: i64,
        #[rowbind(orm = "version,version")]
        pub version: i32,
    }

    #[derive(Default, Debug, Clone, PartialEq, Entity)]
    pub struct Article {
        #[rowbind(embed)]
        pub model: Model,
        #[rowbind(orm = "title")]
        pub title: String,
    }

    #[derive(Default, Debug, Clone, PartialEq, Entity)]
    pub struct Counter {
        #[rowbind(orm = "id,primary,autoincrement")]
        pub id: i64,
    }

    fn mapper() -> Mapper {
        Mapper::new(Arc::new(Registry::default()), Config::default())
    }

    async fn users() -> SqliteExecutor {
        init_logs();
        let executor = SqliteExecutor::connect().await.expect("Could not open SQLite");
        executor
            .run(indoc! {"
                CREATE TABLE users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    age INTEGER NOT NULL,
                    active INTEGER NOT NULL,
                    created TEXT NULL
                )
            "})
            .await
            .expect("Could not create the users table");
        executor
    }

    fn user(name: &str, age: i32) -> User {
        User {
            name: name.into(),
            age,
            active: age % 2 == 0,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn insert_then_fetch() {
        let mut executor = users().await;
        let mapper = mapper();
        let mut alice = User {
            created: Some(datetime!(2024-03-09 10:20:30)),
            ..user("alice", 30)
        };
        let result = mapper
            .insert_one(&mut executor, "users", &mut alice, &[])
            .await
            .expect("Could not insert alice");
        assert_eq!(result.rows_affected, 1);
        assert_eq!(alice.id, 1);

        let mut bob = user("bob", 41);
        mapper
            .insert_one(&mut executor, "users", &mut bob, &[])
            .await
            .expect("Could not insert bob");
        assert_eq!(bob.id, 2);

        let found: Option<User> = mapper
            .fetch_one(
                &mut executor,
                "SELECT * FROM users WHERE id = ?",
                args![alice.id],
                &[],
            )
            .await
            .expect("Could not fetch alice");
        assert_eq!(found.as_ref(), Some(&alice));

        let found: Option<User> = mapper
            .fetch_one(&mut executor, "SELECT * FROM users WHERE id = ?", args![99i64], &[])
            .await
            .expect("Could not run the query");
        assert_eq!(found, None);
    }

    #[tokio::test]
    async fn fetch_many_discards_extra_columns() {
        let mut executor = users().await;
        let mapper = mapper();
        for (name, age) in [("a", 1), ("b", 2), ("c", 3)] {
            mapper
                .insert_one(&mut executor, "users", &mut user(name, age), &[])
                .await
                .expect("Could not insert");
        }
        let found: Vec<User> = mapper
            .fetch_many(
                &mut executor,
                "SELECT name, 42 AS answer, age FROM users ORDER BY age DESC",
                args![],
                &[],
            )
            .await
            .expect("Could not fetch the users");
        assert_eq!(
            found
                .iter()
                .map(|v| (v.id, v.name.as_str(), v.age))
                .collect::<Vec<_>>(),
            [(0, "c", 3), (0, "b", 2), (0, "a", 1)]
        );

        let none: Vec<User> = mapper
            .fetch_many(&mut executor, "SELECT * FROM users WHERE age > ?", args![10], &[])
            .await
            .expect("Could not fetch the users");
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn insert_many_in_batches() {
        let mut executor = RecordingExecutor::new(users().await);
        let mapper = mapper();
        let rows = [user("x", 1), user("y", 2), user("z", 3)];
        let result = mapper
            .insert_many(&mut executor, "users", &rows, &[Opt::BatchSize(2)])
            .await
            .expect("Could not insert the users");
        assert_eq!(result.rows_affected, 3);
        assert_eq!(executor.executed.len(), 2);
        assert_eq!(
            executor.executed[0].sql,
            "INSERT INTO users (`name`,`age`,`active`,`created`) VALUES (?,?,?,?),(?,?,?,?)"
        );
        assert_eq!(executor.executed[0].args.len(), 8);
        assert_eq!(
            executor.executed[1].sql,
            "INSERT INTO users (`name`,`age`,`active`,`created`) VALUES (?,?,?,?)"
        );
        assert_eq!(executor.executed[1].args.len(), 4);

        let stored: Vec<User> = mapper
            .fetch_many(&mut executor, "SELECT * FROM users ORDER BY id", args![], &[])
            .await
            .expect("Could not fetch the users");
        assert_eq!(executor.fetched, 1);
        assert_eq!(
            stored.iter().map(|v| v.name.as_str()).collect::<Vec<_>>(),
            ["x", "y", "z"]
        );
        assert_eq!(stored.iter().map(|v| v.id).collect::<Vec<_>>(), [1, 2, 3]);

        // Nothing to insert, nothing sent.
        mapper
            .insert_many::<User, _>(&mut executor, "users", &[], &[])
            .await
            .expect("Empty insert must succeed");
        assert_eq!(executor.executed.len(), 2);
    }

    #[tokio::test]
    async fn insert_many_default_values() {
        init_logs();
        let inner = SqliteExecutor::connect().await.expect("Could not open SQLite");
        inner
            .run("CREATE TABLE counters (id INTEGER PRIMARY KEY AUTOINCREMENT)")
            .await
            .expect("Could not create the counters table");
        let mut executor = RecordingExecutor::new(inner);
        let mapper = mapper();
        let rows = vec![Counter::default(); 3];
        let result = mapper
            .insert_many(&mut executor, "counters", &rows, &[Opt::BatchSize(2)])
            .await
            .expect("Could not insert the counters");
        assert_eq!(result.rows_affected, 3);
        assert_eq!(executor.executed.len(), 3);
        assert!(
            executor
                .executed
                .iter()
                .all(|v| v.sql == "INSERT INTO counters DEFAULT VALUES" && v.args.is_empty())
        );

        let stored: Vec<Counter> = mapper
            .fetch_many(&mut executor, "SELECT * FROM counters ORDER BY id", args![], &[])
            .await
            .expect("Could not fetch the counters");
        assert_eq!(stored.iter().map(|v| v.id).collect::<Vec<_>>(), [1, 2, 3]);
    }

    #[tokio::test]
    async fn in_list_expansion() {
        let mut executor = users().await;
        let mapper = mapper();
        let rows = [user("p", 10), user("q", 20), user("r", 30), user("s", 40)];
        mapper
            .insert_many(&mut executor, "users", &rows, &[])
            .await
            .expect("Could not insert the users");

        let found: Vec<User> = mapper
            .fetch_many(
                &mut executor,
                "SELECT * FROM users WHERE id IN ? AND age > ? ORDER BY id",
                args![vec![1i64, 3, 4], 15],
                &[],
            )
            .await
            .expect("Could not fetch the users");
        assert_eq!(
            found.iter().map(|v| v.name.as_str()).collect::<Vec<_>>(),
            ["r", "s"]
        );

        let found: Vec<User> = mapper
            .fetch_many(
                &mut executor,
                "SELECT * FROM users WHERE id IN ?",
                args![Vec::<i64>::new()],
                &[],
            )
            .await
            .expect("Could not fetch the users");
        assert!(found.is_empty());

        let found: Vec<User> = mapper
            .fetch_many(
                &mut executor,
                "SELECT * FROM users WHERE id NOT IN ?",
                args![Vec::<i64>::new()],
                &[],
            )
            .await
            .expect("Could not fetch the users");
        assert!(found.is_empty());

        // Without rewriting the list reaches the executor, which refuses it.
        let result = mapper
            .fetch_many::<User, _>(
                &mut executor,
                "SELECT * FROM users WHERE id IN ?",
                args![vec![1i64]],
                &[Opt::RewriteQuery(false)],
            )
            .await;
        assert!(result.is_err());
    }

    async fn accounts() -> SqliteExecutor {
        init_logs();
        let executor = SqliteExecutor::connect().await.expect("Could not open SQLite");
        executor
            .run(indoc! {"
                CREATE TABLE accounts (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    owner TEXT NOT NULL,
                    balance INTEGER NOT NULL,
                    version INTEGER NOT NULL
                )
            "})
            .await
            .expect("Could not create the accounts table");
        executor
    }

    #[tokio::test]
    async fn optimistic_update() {
        let mut executor = accounts().await;
        let mapper = Mapper::new(
            Arc::new(Registry::default()),
            Config::default().optimistic_lock(true),
        );
        let mut account = Account {
            owner: "carol".into(),
            balance: 100,
            ..Default::default()
        };
        mapper
            .insert_one(&mut executor, "accounts", &mut account, &[])
            .await
            .expect("Could not insert the account");
        assert_eq!(account.id, 1);

        account.balance = 80;
        let result = mapper
            .update_one(&mut executor, "accounts", &mut account, &[])
            .await
            .expect("Could not update the account");
        assert_eq!(result.rows_affected, 1);
        assert_eq!(account.version, 1);

        let stored: Option<Account> = mapper
            .fetch_one(&mut executor, "SELECT * FROM accounts WHERE id = ?", args![1i64], &[])
            .await
            .expect("Could not fetch the account");
        assert_eq!(stored.as_ref(), Some(&account));

        // Somebody else writes in between.
        executor
            .run("UPDATE accounts SET version = version + 1, balance = 0 WHERE id = 1")
            .await
            .expect("Could not update behind the mapper");
        account.balance = 50;
        let error = mapper
            .update_one(&mut executor, "accounts", &mut account, &[])
            .await
            .expect_err("Stale version must be rejected");
        assert!(is_concurrency_update(&error));
        assert!(matches!(
            error.downcast_ref::<MappingError>(),
            Some(MappingError::ConcurrencyUpdate { table }) if table == "accounts"
        ));
        assert_eq!(account.version, 1);

        let stored: Option<Account> = mapper
            .fetch_one(&mut executor, "SELECT * FROM accounts WHERE id = ?", args![1i64], &[])
            .await
            .expect("Could not fetch the account");
        let stored = stored.expect("The account must exist");
        assert_eq!(stored.version, 2);
        assert_eq!(stored.balance, 0);

        // Refreshed copy goes through.
        let mut refreshed = Account {
            balance: 50,
            ..stored
        };
        mapper
            .update_one(&mut executor, "accounts", &mut refreshed, &[])
            .await
            .expect("Could not update the refreshed account");
        assert_eq!(refreshed.version, 3);
    }

    #[tokio::test]
    async fn update_without_lock() {
        let mut executor = RecordingExecutor::new(accounts().await);
        let mapper = mapper();
        let mut account = Account {
            owner: "dave".into(),
            balance: 5,
            version: 7,
            ..Default::default()
        };
        mapper
            .insert_one(&mut executor, "accounts", &mut account, &[])
            .await
            .expect("Could not insert the account");

        account.balance = 6;
        let result = mapper
            .update_one(&mut executor, "accounts", &mut account, &[])
            .await
            .expect("Could not update the account");
        assert_eq!(result.rows_affected, 1);
        assert_eq!(account.version, 7);
        let last = executor.executed.last().expect("Nothing was executed");
        assert_eq!(
            last.sql,
            "UPDATE accounts SET `owner`=?,`balance`=?,`version`=? WHERE `id`=?"
        );

        // Enabled per call.
        mapper
            .update_one(
                &mut executor,
                "accounts",
                &mut account,
                &[Opt::OptimisticLock(true)],
            )
            .await
            .expect("Could not update the account");
        assert_eq!(account.version, 8);
        let last = executor.executed.last().expect("Nothing was executed");
        assert_eq!(
            last.sql,
            "UPDATE accounts SET `owner`=?,`balance`=?,`version`=? WHERE `id`=? AND `version`=?"
        );

        // No matching row and no version: zero rows is not a conflict.
        let mut ghost = Account {
            id: 404,
            ..Default::default()
        };
        let result = mapper
            .update_one(&mut executor, "accounts", &mut ghost, &[])
            .await
            .expect("Update of a missing row must not fail");
        assert_eq!(result.rows_affected, 0);
    }

    #[tokio::test]
    async fn embedded_model() {
        let mut executor = SqliteExecutor::connect().await.expect("Could not open SQLite");
        init_logs();
        executor
            .run(indoc! {"
                CREATE TABLE articles (
                    id INTEGER PRIMARY KEY,
                    title TEXT NOT NULL,
                    create_at TEXT NULL,
                    update_at TEXT NULL,
                    delete_at TEXT NULL
                )
            "})
            .await
            .expect("Could not create the articles table");
        let mapper = mapper();
        let mut article = Article {
            model: Model {
                id: 10,
                create_at: Some(datetime!(2023-12-31 23:59:59.5)),
                ..Default::default()
            },
            title: "Hello".into(),
        };
        mapper
            .insert_one(&mut executor, "articles", &mut article, &[])
            .await
            .expect("Could not insert the article");

        let found: Option<Article> = mapper
            .fetch_one(
                &mut executor,
                "SELECT * FROM articles WHERE id = ?",
                args![10i64],
                &[],
            )
            .await
            .expect("Could not fetch the article");
        assert_eq!(found, Some(article));

        let missing: Vec<Article> = mapper
            .fetch_many(
                &mut executor,
                "SELECT * FROM articles WHERE delete_at IS NOT NULL",
                args![],
                &[],
            )
            .await
            .expect("Could not fetch the articles");
        assert!(missing.is_empty());
    }
}
