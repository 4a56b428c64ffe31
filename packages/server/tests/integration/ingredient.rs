use serde_json::Value;

use crate::common::{TestApp, ingredient_form, routes, with_image};

/// Find an ingredient object by name in a list response.
fn find_by_name<'a>(list: &'a Value, name: &str) -> Option<&'a Value> {
    list.as_array()
        .expect("list response should be an array")
        .iter()
        .find(|item| item["name"] == name)
}

mod ingredient_creation {
    use super::*;

    #[tokio::test]
    async fn created_ingredients_are_retrievable() {
        let app = TestApp::spawn().await;

        let res = app
            .post_multipart(routes::INGREDIENTS, ingredient_form("Tomato"))
            .await;
        assert_eq!(res.status, 201);
        assert_eq!(res.body["name"], "Tomato");
        assert_eq!(res.body["category"], "vegetable");
        assert_eq!(res.body["per_unit"], 100);
        assert!(res.body["id"].is_number());

        let list = app.get(routes::INGREDIENTS).await;
        assert_eq!(list.status, 200);
        let tomato = find_by_name(&list.body, "Tomato").expect("Tomato should be listed");
        assert_eq!(tomato["calories"], 18.0);
        assert_eq!(tomato["fiber"], 1.2);
    }

    #[tokio::test]
    async fn listing_is_ordered_by_name() {
        let app = TestApp::spawn().await;
        app.create_ingredient("Zucchini").await;
        app.create_ingredient("Apple").await;
        app.create_ingredient("Lentils").await;

        let list = app.get(routes::INGREDIENTS).await;
        let names: Vec<&str> = list
            .body
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Apple", "Lentils", "Zucchini"]);
    }

    #[tokio::test]
    async fn duplicate_names_are_rejected() {
        let app = TestApp::spawn().await;
        app.create_ingredient("Tomato").await;

        let res = app
            .post_multipart(routes::INGREDIENTS, ingredient_form("Tomato"))
            .await;
        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn missing_name_is_rejected() {
        let app = TestApp::spawn().await;

        let form = reqwest::multipart::Form::new().text("category", "vegetable");
        let res = app.post_multipart(routes::INGREDIENTS, form).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn non_numeric_nutrition_is_rejected() {
        let app = TestApp::spawn().await;

        let form = reqwest::multipart::Form::new()
            .text("name", "Tofu")
            .text("calories", "lots");
        let res = app.post_multipart(routes::INGREDIENTS, form).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn empty_optional_fields_are_stored_as_null() {
        let app = TestApp::spawn().await;

        // Browsers submit untouched inputs as empty strings.
        let form = reqwest::multipart::Form::new()
            .text("name", "Salt")
            .text("category", "")
            .text("calories", "")
            .text("price", "");
        let res = app.post_multipart(routes::INGREDIENTS, form).await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["category"], Value::Null);
        assert_eq!(res.body["calories"], Value::Null);
        assert_eq!(res.body["price"], Value::Null);
    }
}

mod ingredient_update {
    use super::*;

    #[tokio::test]
    async fn update_replaces_scalar_fields() {
        let app = TestApp::spawn().await;
        let id = app.create_ingredient("Tomato").await;

        let form = reqwest::multipart::Form::new()
            .text("name", "Cherry Tomato")
            .text("calories", "20")
            .text("price", "1.2");
        let res = app.put_multipart(&routes::ingredient(id), form).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["name"], "Cherry Tomato");
        assert_eq!(res.body["calories"], 20.0);
        // Fields absent from the form are cleared; it is a full replacement.
        assert_eq!(res.body["category"], Value::Null);
    }

    #[tokio::test]
    async fn updating_a_missing_ingredient_returns_404() {
        let app = TestApp::spawn().await;

        let res = app
            .put_multipart(&routes::ingredient(4242), ingredient_form("Ghost"))
            .await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn renaming_onto_an_existing_name_is_rejected() {
        let app = TestApp::spawn().await;
        app.create_ingredient("Tomato").await;
        let id = app.create_ingredient("Potato").await;

        let res = app
            .put_multipart(&routes::ingredient(id), ingredient_form("Tomato"))
            .await;
        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }
}

mod ingredient_deletion {
    use super::*;
    use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
    use server::entity::{meal_entry, recipe_ingredient};

    #[tokio::test]
    async fn deleted_ingredients_disappear_from_the_list() {
        let app = TestApp::spawn().await;
        let id = app.create_ingredient("Tomato").await;

        let res = app.delete(&routes::ingredient(id)).await;
        assert_eq!(res.status, 204);

        let list = app.get(routes::INGREDIENTS).await;
        assert!(find_by_name(&list.body, "Tomato").is_none());
    }

    #[tokio::test]
    async fn deleting_a_missing_ingredient_returns_404() {
        let app = TestApp::spawn().await;

        let res = app.delete(&routes::ingredient(4242)).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn deletion_cascades_to_recipes_and_plan_entries() {
        let app = TestApp::spawn().await;
        let tomato = app.create_ingredient("Tomato").await;
        let onion = app.create_ingredient("Onion").await;
        let recipe_id = app
            .create_recipe("Soup", &[(tomato, 300.0), (onion, 100.0)])
            .await;
        app.plan_ingredient("2025-06-01", "snack", tomato, 80.0).await;

        let res = app.delete(&routes::ingredient(tomato)).await;
        assert_eq!(res.status, 204);

        let remaining_links = recipe_ingredient::Entity::find()
            .filter(recipe_ingredient::Column::IngredientId.eq(tomato))
            .count(&app.db)
            .await
            .expect("DB query failed");
        assert_eq!(remaining_links, 0);

        let remaining_entries = meal_entry::Entity::find()
            .filter(meal_entry::Column::IngredientId.eq(tomato))
            .count(&app.db)
            .await
            .expect("DB query failed");
        assert_eq!(remaining_entries, 0);

        // The recipe itself survives with its other ingredient.
        let list = app.get(routes::RECIPES).await;
        let soup = list.body[0].clone();
        assert_eq!(soup["id"], recipe_id);
        let names: Vec<&str> = soup["ingredients"]
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Onion"]);
    }
}

mod ingredient_images {
    use super::*;

    #[tokio::test]
    async fn uploaded_images_are_stored_and_referenced() {
        let app = TestApp::spawn().await;

        let form = with_image(ingredient_form("Tomato"), "tomato.png", b"png".to_vec());
        let res = app.post_multipart(routes::INGREDIENTS, form).await;
        assert_eq!(res.status, 201, "{}", res.text);

        let url = res.body["image_url"].as_str().expect("image_url expected");
        assert!(url.starts_with("/uploads/ingredients/"));
        assert!(app.image_path(url).exists());
    }

    #[tokio::test]
    async fn a_new_image_replaces_the_old_file() {
        let app = TestApp::spawn().await;

        let form = with_image(ingredient_form("Tomato"), "old.png", b"old".to_vec());
        let res = app.post_multipart(routes::INGREDIENTS, form).await;
        let id = res.id();
        let old_url = res.body["image_url"].as_str().unwrap().to_string();

        let form = with_image(ingredient_form("Tomato"), "new.png", b"new".to_vec());
        let res = app.put_multipart(&routes::ingredient(id), form).await;
        assert_eq!(res.status, 200, "{}", res.text);
        let new_url = res.body["image_url"].as_str().unwrap().to_string();

        assert_ne!(old_url, new_url);
        assert!(!app.image_path(&old_url).exists());
        assert!(app.image_path(&new_url).exists());
    }

    #[tokio::test]
    async fn updates_without_an_image_keep_the_existing_one() {
        let app = TestApp::spawn().await;

        let form = with_image(ingredient_form("Tomato"), "tomato.png", b"png".to_vec());
        let res = app.post_multipart(routes::INGREDIENTS, form).await;
        let id = res.id();
        let url = res.body["image_url"].as_str().unwrap().to_string();

        let res = app
            .put_multipart(&routes::ingredient(id), ingredient_form("Tomato"))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["image_url"], url.as_str());
        assert!(app.image_path(&url).exists());
    }

    #[tokio::test]
    async fn deleting_an_ingredient_deletes_its_image_file() {
        let app = TestApp::spawn().await;

        let form = with_image(ingredient_form("Tomato"), "tomato.png", b"png".to_vec());
        let res = app.post_multipart(routes::INGREDIENTS, form).await;
        let id = res.id();
        let url = res.body["image_url"].as_str().unwrap().to_string();

        let res = app.delete(&routes::ingredient(id)).await;
        assert_eq!(res.status, 204);
        assert!(!app.image_path(&url).exists());
    }
}
