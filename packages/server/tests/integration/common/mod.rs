use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use reqwest::Client;
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use tempfile::TempDir;

use server::config::{AppConfig, CorsConfig, DatabaseConfig, ServerConfig, StorageConfig};
use server::state::AppState;
use server::storage::ImageStore;

pub mod routes {
    pub const INGREDIENTS: &str = "/api/v1/ingredients";
    pub const RECIPES: &str = "/api/v1/recipes";
    pub const PLANNER: &str = "/api/v1/planner";

    pub fn ingredient(id: i32) -> String {
        format!("{INGREDIENTS}/{id}")
    }

    pub fn recipe(id: i32) -> String {
        format!("{RECIPES}/{id}")
    }

    pub fn plan_entry(id: i32) -> String {
        format!("{PLANNER}/{id}")
    }

    pub fn plan_day(date: &str) -> String {
        format!("{PLANNER}/{date}")
    }
}

/// A running test server backed by a temp-dir SQLite database and public dir.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: DatabaseConnection,
    pub public_dir: PathBuf,
    _dir: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");

        let db_path = dir.path().join("larder-test.db");
        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
        let db = server::database::init_db(&db_url)
            .await
            .expect("Failed to initialize test database");

        let public_dir = dir.path().join("public");
        let images = ImageStore::new(public_dir.clone(), 4 * 1024 * 1024)
            .await
            .expect("Failed to initialize image store");
        std::fs::write(
            public_dir.join("index.html"),
            "<!doctype html><title>Larder</title>",
        )
        .expect("Failed to write index.html");

        let config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig { url: db_url },
            storage: StorageConfig {
                public_dir: public_dir.clone(),
                max_image_size: 4 * 1024 * 1024,
                placeholder_image: "/default-recipe.png".to_string(),
            },
        };

        let state = AppState {
            db: db.clone(),
            config,
            images: Arc::new(images),
        };
        let app = server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            db,
            public_dir,
            _dir: dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn delete(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    pub async fn post_multipart(&self, path: &str, form: reqwest::multipart::Form) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart POST request");

        TestResponse::from_response(res).await
    }

    pub async fn put_multipart(&self, path: &str, form: reqwest::multipart::Form) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart PUT request");

        TestResponse::from_response(res).await
    }

    /// Create an ingredient via the API and return its `id`.
    pub async fn create_ingredient(&self, name: &str) -> i32 {
        let res = self
            .post_multipart(routes::INGREDIENTS, ingredient_form(name))
            .await;
        assert_eq!(res.status, 201, "create_ingredient failed: {}", res.text);
        res.id()
    }

    /// Create a recipe via the API and return its `id`.
    pub async fn create_recipe(&self, name: &str, ingredients: &[(i32, f64)]) -> i32 {
        let res = self
            .post_multipart(routes::RECIPES, recipe_form(name, ingredients))
            .await;
        assert_eq!(res.status, 201, "create_recipe failed: {}", res.text);
        res.id()
    }

    /// Schedule a recipe on the plan via the API and return the entry `id`.
    pub async fn plan_recipe(&self, date: &str, meal_type: &str, recipe_id: i32) -> i32 {
        let res = self
            .post_json(
                routes::PLANNER,
                &json!({
                    "date": date,
                    "meal_type": meal_type,
                    "item_type": "recipe",
                    "item_id": recipe_id,
                }),
            )
            .await;
        assert_eq!(res.status, 201, "plan_recipe failed: {}", res.text);
        res.id()
    }

    /// Schedule an ingredient portion on the plan and return the entry `id`.
    pub async fn plan_ingredient(
        &self,
        date: &str,
        meal_type: &str,
        ingredient_id: i32,
        quantity_grams: f64,
    ) -> i32 {
        let res = self
            .post_json(
                routes::PLANNER,
                &json!({
                    "date": date,
                    "meal_type": meal_type,
                    "item_type": "ingredient",
                    "item_id": ingredient_id,
                    "quantity_grams": quantity_grams,
                }),
            )
            .await;
        assert_eq!(res.status, 201, "plan_ingredient failed: {}", res.text);
        res.id()
    }

    /// Absolute filesystem path behind a public image URL.
    pub fn image_path(&self, url: &str) -> PathBuf {
        self.public_dir.join(url.trim_start_matches('/'))
    }
}

/// A filled-in ingredient multipart form without an image.
pub fn ingredient_form(name: &str) -> reqwest::multipart::Form {
    reqwest::multipart::Form::new()
        .text("name", name.to_string())
        .text("category", "vegetable")
        .text("calories", "18")
        .text("protein", "0.9")
        .text("carbs", "3.9")
        .text("fat", "0.2")
        .text("fiber", "1.2")
        .text("price", "0.5")
}

/// Attach an image file part to a multipart form.
pub fn with_image(
    form: reqwest::multipart::Form,
    file_name: &str,
    bytes: Vec<u8>,
) -> reqwest::multipart::Form {
    let part = reqwest::multipart::Part::bytes(bytes)
        .file_name(file_name.to_string())
        .mime_str("image/png")
        .expect("Failed to set MIME type");
    form.part("image", part)
}

/// A recipe multipart form carrying the `recipe_data` JSON field.
pub fn recipe_form(name: &str, ingredients: &[(i32, f64)]) -> reqwest::multipart::Form {
    let ingredients: Vec<Value> = ingredients
        .iter()
        .map(|(id, quantity_grams)| json!({"id": id, "quantity_grams": quantity_grams}))
        .collect();
    let data = json!({
        "name": name,
        "instructions": "Mix everything.",
        "ingredients": ingredients,
    });
    reqwest::multipart::Form::new().text("recipe_data", data.to_string())
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }

    pub fn id(&self) -> i32 {
        self.body["id"]
            .as_i64()
            .expect("response body should contain 'id'") as i32
    }
}
