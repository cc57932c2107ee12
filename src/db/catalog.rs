//! Catalog documents: articles, categories, products and image sliders.

use super::turso::{db_err, TursoClient};
use crate::types::{
    AppError, Article, Category, CategoryRef, ImageSlider, Product, ProductFilter, ProductRecord,
    Result,
};
use chrono::{DateTime, Duration, Utc};
use libsql::Row;
use uuid::Uuid;

/// Products created within this window are flagged `new` when saved.
pub const NEW_PRODUCT_WINDOW_DAYS: i64 = 7;

/// Whether a product created at `created_at` counts as new at `now`.
pub fn is_fresh(created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    created_at > now - Duration::days(NEW_PRODUCT_WINDOW_DAYS)
}

fn encode_list(values: &[String]) -> Result<String> {
    serde_json::to_string(values)
        .map_err(|e| AppError::Internal(format!("Failed to encode list: {}", e)))
}

fn decode_list(raw: &str) -> Result<Vec<String>> {
    serde_json::from_str(raw)
        .map_err(|e| AppError::Database(format!("Corrupt list column: {}", e)))
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| AppError::Database(format!("Invalid timestamp: {}", secs)))
}

/// `%fragment%` for a case-insensitive LIKE, with wildcards in the input escaped.
///
/// Folds ASCII only, matching SQLite's `lower()`.
fn like_pattern(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len() + 2);
    escaped.push('%');
    for c in fragment.to_ascii_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// SQLite integer for a row count; a negative LIMIT would mean "no limit".
fn sql_count(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn article_from_row(row: &Row) -> Result<Article> {
    let tag: String = row.get(4).map_err(db_err)?;
    Ok(Article {
        id: row.get(0).map_err(db_err)?,
        title: row.get(1).map_err(db_err)?,
        description: row.get(2).map_err(db_err)?,
        image: row.get(3).map_err(db_err)?,
        tag: decode_list(&tag)?,
    })
}

fn category_from_row(row: &Row) -> Result<Category> {
    Ok(Category {
        id: row.get(0).map_err(db_err)?,
        name: row.get(1).map_err(db_err)?,
        image: row.get(2).map_err(db_err)?,
    })
}

fn slider_from_row(row: &Row) -> Result<ImageSlider> {
    Ok(ImageSlider {
        id: row.get(0).map_err(db_err)?,
        name: row.get(1).map_err(db_err)?,
        image: row.get(2).map_err(db_err)?,
    })
}

const PRODUCT_COLUMNS: &str =
    "id, name, description, image, category, tag, hot, is_new, created_at, updated_at";

fn product_from_row(row: &Row) -> Result<ProductRecord> {
    let image: String = row.get(3).map_err(db_err)?;
    let category: String = row.get(4).map_err(db_err)?;
    let tag: String = row.get(5).map_err(db_err)?;

    Ok(ProductRecord {
        id: row.get(0).map_err(db_err)?,
        name: row.get(1).map_err(db_err)?,
        description: row.get(2).map_err(db_err)?,
        image: decode_list(&image)?,
        category: decode_list(&category)?,
        tag: decode_list(&tag)?,
        hot: row.get::<i64>(6).map_err(db_err)? != 0,
        is_new: row.get::<i64>(7).map_err(db_err)? != 0,
        created_at: timestamp(row.get(8).map_err(db_err)?)?,
        updated_at: timestamp(row.get(9).map_err(db_err)?)?,
    })
}

impl TursoClient {
    // ============= Articles =============

    pub async fn create_article(
        &self,
        title: &str,
        description: &str,
        tag: &[String],
    ) -> Result<Article> {
        let conn = self.connection()?;
        let id = Uuid::new_v4().to_string();

        conn.execute(
            "INSERT INTO articles (id, title, description, image, tag) VALUES (?, ?, ?, NULL, ?)",
            (id.as_str(), title, description, encode_list(tag)?),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create article: {}", e)))?;

        Ok(Article {
            id,
            title: title.to_string(),
            description: description.to_string(),
            image: None,
            tag: tag.to_vec(),
        })
    }

    pub async fn list_articles(&self) -> Result<Vec<Article>> {
        let conn = self.connection()?;

        let mut rows = conn
            .query(
                "SELECT id, title, description, image, tag FROM articles ORDER BY rowid",
                (),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query articles: {}", e)))?;

        let mut articles = Vec::new();
        while let Some(row) = rows.next().await.map_err(db_err)? {
            articles.push(article_from_row(&row)?);
        }

        Ok(articles)
    }

    pub async fn get_article(&self, id: &str) -> Result<Option<Article>> {
        let conn = self.connection()?;

        let mut rows = conn
            .query(
                "SELECT id, title, description, image, tag FROM articles WHERE id = ?",
                [id],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query article: {}", e)))?;

        match rows.next().await.map_err(db_err)? {
            Some(row) => Ok(Some(article_from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Applies the given fields; `None` keeps the stored value.
    pub async fn update_article(
        &self,
        id: &str,
        title: Option<&str>,
        description: Option<&str>,
        tag: Option<&[String]>,
    ) -> Result<Option<Article>> {
        let conn = self.connection()?;
        let tag = tag.map(encode_list).transpose()?;

        let updated = conn
            .execute(
                "UPDATE articles SET
                    title = COALESCE(?, title),
                    description = COALESCE(?, description),
                    tag = COALESCE(?, tag)
                 WHERE id = ?",
                (title, description, tag, id),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to update article: {}", e)))?;

        if updated == 0 {
            return Ok(None);
        }

        self.get_article(id).await
    }

    pub async fn delete_article(&self, id: &str) -> Result<bool> {
        let conn = self.connection()?;

        let deleted = conn
            .execute("DELETE FROM articles WHERE id = ?", [id])
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete article: {}", e)))?;

        Ok(deleted > 0)
    }

    // ============= Categories =============

    pub async fn create_category(&self, name: &str, image: &str) -> Result<Category> {
        let conn = self.connection()?;
        let id = Uuid::new_v4().to_string();

        conn.execute(
            "INSERT INTO categories (id, name, image) VALUES (?, ?, ?)",
            (id.as_str(), name, image),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create category: {}", e)))?;

        Ok(Category {
            id,
            name: name.to_string(),
            image: Some(image.to_string()),
        })
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let conn = self.connection()?;

        let mut rows = conn
            .query("SELECT id, name, image FROM categories ORDER BY rowid", ())
            .await
            .map_err(|e| AppError::Database(format!("Failed to query categories: {}", e)))?;

        let mut categories = Vec::new();
        while let Some(row) = rows.next().await.map_err(db_err)? {
            categories.push(category_from_row(&row)?);
        }

        Ok(categories)
    }

    pub async fn get_category(&self, id: &str) -> Result<Option<Category>> {
        let conn = self.connection()?;

        let mut rows = conn
            .query("SELECT id, name, image FROM categories WHERE id = ?", [id])
            .await
            .map_err(|e| AppError::Database(format!("Failed to query category: {}", e)))?;

        match rows.next().await.map_err(db_err)? {
            Some(row) => Ok(Some(category_from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// First category whose name contains `fragment`, ignoring case.
    pub async fn find_category_by_name(&self, fragment: &str) -> Result<Option<Category>> {
        let conn = self.connection()?;

        let mut rows = conn
            .query(
                "SELECT id, name, image FROM categories
                 WHERE lower(name) LIKE ? ESCAPE '\\'
                 ORDER BY rowid LIMIT 1",
                [like_pattern(fragment)],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query category: {}", e)))?;

        match rows.next().await.map_err(db_err)? {
            Some(row) => Ok(Some(category_from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Ids from `ids` that do not name a stored category.
    pub async fn missing_categories(&self, ids: &[String]) -> Result<Vec<String>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.connection()?;

        let mut rows = conn
            .query(
                "SELECT j.value FROM json_each(?) j
                 WHERE j.value NOT IN (SELECT id FROM categories)
                 ORDER BY j.key",
                [encode_list(ids)?],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to check categories: {}", e)))?;

        let mut missing = Vec::new();
        while let Some(row) = rows.next().await.map_err(db_err)? {
            missing.push(row.get::<String>(0).map_err(db_err)?);
        }

        Ok(missing)
    }

    pub async fn categories_exist(&self, ids: &[String]) -> Result<bool> {
        Ok(self.missing_categories(ids).await?.is_empty())
    }

    pub async fn update_category(
        &self,
        id: &str,
        name: &str,
        image: &str,
    ) -> Result<Option<Category>> {
        let conn = self.connection()?;

        let updated = conn
            .execute(
                "UPDATE categories SET name = ?, image = ? WHERE id = ?",
                (name, image, id),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to update category: {}", e)))?;

        if updated == 0 {
            return Ok(None);
        }

        Ok(Some(Category {
            id: id.to_string(),
            name: name.to_string(),
            image: Some(image.to_string()),
        }))
    }

    pub async fn delete_category(&self, id: &str) -> Result<bool> {
        let conn = self.connection()?;

        let deleted = conn
            .execute("DELETE FROM categories WHERE id = ?", [id])
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete category: {}", e)))?;

        Ok(deleted > 0)
    }

    /// `{id, name}` for each id that still exists, in the given order.
    async fn category_refs(&self, ids: &[String]) -> Result<Vec<CategoryRef>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.connection()?;

        let mut rows = conn
            .query(
                "SELECT c.id, c.name FROM json_each(?) j
                 JOIN categories c ON c.id = j.value
                 ORDER BY j.key",
                [encode_list(ids)?],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to populate categories: {}", e)))?;

        let mut refs = Vec::new();
        while let Some(row) = rows.next().await.map_err(db_err)? {
            refs.push(CategoryRef {
                id: row.get(0).map_err(db_err)?,
                name: row.get(1).map_err(db_err)?,
            });
        }

        Ok(refs)
    }

    // ============= Products =============

    /// Inserts a new product; `created_at`, `updated_at` and `new` are set here.
    pub async fn insert_product(&self, mut record: ProductRecord) -> Result<Product> {
        let conn = self.connection()?;
        let now = Utc::now();
        record.created_at = now;
        record.updated_at = now;
        record.is_new = is_fresh(record.created_at, now);

        conn.execute(
            &format!(
                "INSERT INTO products ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                PRODUCT_COLUMNS
            ),
            (
                record.id.as_str(),
                record.name.as_str(),
                record.description.as_str(),
                encode_list(&record.image)?,
                encode_list(&record.category)?,
                encode_list(&record.tag)?,
                record.hot as i64,
                record.is_new as i64,
                record.created_at.timestamp(),
                record.updated_at.timestamp(),
            ),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create product: {}", e)))?;

        self.populate(record).await
    }

    /// Writes back a modified product, refreshing `updated_at` and `new`.
    pub async fn save_product(&self, mut record: ProductRecord) -> Result<Option<Product>> {
        let conn = self.connection()?;
        let now = Utc::now();
        record.updated_at = now;
        record.is_new = is_fresh(record.created_at, now);

        let updated = conn
            .execute(
                "UPDATE products SET
                    name = ?, description = ?, image = ?, category = ?, tag = ?,
                    hot = ?, is_new = ?, updated_at = ?
                 WHERE id = ?",
                (
                    record.name.as_str(),
                    record.description.as_str(),
                    encode_list(&record.image)?,
                    encode_list(&record.category)?,
                    encode_list(&record.tag)?,
                    record.hot as i64,
                    record.is_new as i64,
                    record.updated_at.timestamp(),
                    record.id.as_str(),
                ),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to update product: {}", e)))?;

        if updated == 0 {
            return Ok(None);
        }

        self.populate(record).await.map(Some)
    }

    pub async fn get_product_record(&self, id: &str) -> Result<Option<ProductRecord>> {
        let conn = self.connection()?;

        let mut rows = conn
            .query(
                &format!("SELECT {} FROM products WHERE id = ?", PRODUCT_COLUMNS),
                [id],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query product: {}", e)))?;

        match rows.next().await.map_err(db_err)? {
            Some(row) => Ok(Some(product_from_row(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn get_product(&self, id: &str) -> Result<Option<Product>> {
        match self.get_product_record(id).await? {
            Some(record) => self.populate(record).await.map(Some),
            None => Ok(None),
        }
    }

    pub async fn count_products(&self, filter: &ProductFilter) -> Result<u64> {
        let conn = self.connection()?;

        let mut rows = conn
            .query(
                "SELECT COUNT(*) FROM products
                 WHERE (?1 IS NULL OR EXISTS
                        (SELECT 1 FROM json_each(products.category) WHERE json_each.value = ?1))
                   AND (?2 IS NULL OR lower(name) LIKE ?2 ESCAPE '\\')",
                (
                    filter.category_id.as_deref(),
                    filter.name.as_deref().map(like_pattern),
                ),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to count products: {}", e)))?;

        let count: i64 = match rows.next().await.map_err(db_err)? {
            Some(row) => row.get(0).map_err(db_err)?,
            None => 0,
        };

        Ok(count.max(0) as u64)
    }

    /// Newest first.
    pub async fn list_products(
        &self,
        filter: &ProductFilter,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Product>> {
        let conn = self.connection()?;

        let mut rows = conn
            .query(
                &format!(
                    "SELECT {} FROM products
                     WHERE (?1 IS NULL OR EXISTS
                            (SELECT 1 FROM json_each(products.category) WHERE json_each.value = ?1))
                       AND (?2 IS NULL OR lower(name) LIKE ?2 ESCAPE '\\')
                     ORDER BY created_at DESC, rowid DESC
                     LIMIT ?3 OFFSET ?4",
                    PRODUCT_COLUMNS
                ),
                (
                    filter.category_id.as_deref(),
                    filter.name.as_deref().map(like_pattern),
                    sql_count(limit),
                    sql_count(offset),
                ),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query products: {}", e)))?;

        let mut records = Vec::new();
        while let Some(row) = rows.next().await.map_err(db_err)? {
            records.push(product_from_row(&row)?);
        }

        let mut products = Vec::with_capacity(records.len());
        for record in records {
            products.push(self.populate(record).await?);
        }

        Ok(products)
    }

    pub async fn delete_product(&self, id: &str) -> Result<bool> {
        let conn = self.connection()?;

        let deleted = conn
            .execute("DELETE FROM products WHERE id = ?", [id])
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete product: {}", e)))?;

        Ok(deleted > 0)
    }

    async fn populate(&self, record: ProductRecord) -> Result<Product> {
        let category = self.category_refs(&record.category).await?;

        Ok(Product {
            id: record.id,
            name: record.name,
            description: record.description,
            image: record.image,
            category,
            tag: record.tag,
            hot: record.hot,
            is_new: record.is_new,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }

    // ============= Image sliders =============

    pub async fn create_slider(&self, name: &str, image: &str) -> Result<ImageSlider> {
        let conn = self.connection()?;
        let id = Uuid::new_v4().to_string();

        conn.execute(
            "INSERT INTO image_sliders (id, name, image) VALUES (?, ?, ?)",
            (id.as_str(), name, image),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create image slider: {}", e)))?;

        Ok(ImageSlider {
            id,
            name: name.to_string(),
            image: image.to_string(),
        })
    }

    pub async fn list_sliders(&self) -> Result<Vec<ImageSlider>> {
        let conn = self.connection()?;

        let mut rows = conn
            .query("SELECT id, name, image FROM image_sliders ORDER BY rowid", ())
            .await
            .map_err(|e| AppError::Database(format!("Failed to query image sliders: {}", e)))?;

        let mut sliders = Vec::new();
        while let Some(row) = rows.next().await.map_err(db_err)? {
            sliders.push(slider_from_row(&row)?);
        }

        Ok(sliders)
    }

    pub async fn get_slider(&self, id: &str) -> Result<Option<ImageSlider>> {
        let conn = self.connection()?;

        let mut rows = conn
            .query("SELECT id, name, image FROM image_sliders WHERE id = ?", [id])
            .await
            .map_err(|e| AppError::Database(format!("Failed to query image slider: {}", e)))?;

        match rows.next().await.map_err(db_err)? {
            Some(row) => Ok(Some(slider_from_row(&row)?)),
            None => Ok(None),
        }
    }
}
