//! Catalog plumbing: enough product and category handling for orders to
//! have something to price.

use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::OrderService;
use crate::domain::{Category, NewCategory, NewProduct, Product};
use crate::{Entity, OrderError, Result};

impl OrderService {
    pub async fn create_category(&self, new: NewCategory) -> Result<Category> {
        new.validate()?;
        let category = self.call("insert category", self.catalog.insert_category(Category::create(new))).await?;
        info!(category_id = %category.id, "Category created");
        Ok(category)
    }

    pub async fn get_category(&self, id: Uuid) -> Result<Category> {
        self.call("find category", self.catalog.find_category(id)).await?
            .ok_or_else(|| OrderError::not_found(Entity::Category, id))
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        self.call("list categories", self.catalog.list_categories()).await
    }

    /// Fails with `NotFound` when the referenced category does not exist.
    pub async fn create_product(&self, new: NewProduct) -> Result<Product> {
        new.validate()?;
        if let Some(category) = new.category {
            self.get_category(category).await?;
        }
        let product = self.call("insert product", self.catalog.insert_product(Product::create(new))).await?;
        info!(product_id = %product.id, price = %product.price, "Product created");
        Ok(product)
    }

    pub async fn get_product(&self, id: Uuid) -> Result<Product> {
        self.call("find product", self.catalog.find_product(id)).await?
            .ok_or_else(|| OrderError::not_found(Entity::Product, id))
    }

    pub async fn list_products(&self) -> Result<Vec<Product>> {
        self.call("list products", self.catalog.list_products()).await
    }
}
