#[cfg(test)]
mod tests {
    use crate::database::entity::product;
    use crate::database::postgres_repo::PostgresProductRepository;
    use clickmart_core::domain::Product;
    use clickmart_core::error::RepoError;
    use clickmart_core::ports::{BaseRepository, ProductRepository};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn product_model(id: uuid::Uuid, clicks: i64) -> product::Model {
        let now = chrono::Utc::now();
        product::Model {
            id,
            category_id: None,
            name: "Wireless Earbuds".to_owned(),
            affiliate_url: "https://shopee.example/earbuds?aff=42".to_owned(),
            click_count: clicks,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[tokio::test]
    async fn find_product_by_id() {
        let product_id = uuid::Uuid::new_v4();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![product_model(product_id, 3)]])
            .into_connection();

        let repo = PostgresProductRepository::new(db);

        let result: Option<Product> = repo.find_by_id(product_id).await.unwrap();

        let found = result.unwrap();
        assert_eq!(found.id, product_id);
        assert_eq!(found.click_count, 3);
        assert_eq!(found.affiliate_url, "https://shopee.example/earbuds?aff=42");
    }

    #[tokio::test]
    async fn increment_clicks_touches_one_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let repo = PostgresProductRepository::new(db);

        assert!(repo.increment_clicks(uuid::Uuid::new_v4()).await.is_ok());
    }

    #[tokio::test]
    async fn increment_clicks_reports_missing_product() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let repo = PostgresProductRepository::new(db);

        let err = repo.increment_clicks(uuid::Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, RepoError::NotFound));
    }
}
