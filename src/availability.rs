//! Menu availability sync: recomputes each menu item's `is_available` flag
//! from its recipe lines and the current ingredient stock.

use std::collections::HashMap;

use anyhow::{Context, Result};
use diesel::{ExpressionMethods, QueryDsl};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    models::MenuIngredientEntity,
    schema::{ingredients, menu_ingredients, menu_items},
};

/// A recipe line resolved against stock: `(required quantity, stock on hand)`.
pub type ResolvedLine = (f32, f32);

/// An item is available iff it has a recipe and every line's ingredient has
/// enough stock. An empty recipe means the kitchen cannot prepare it.
pub fn is_item_available(recipe: &[ResolvedLine]) -> bool {
    !recipe.is_empty()
        && recipe
            .iter()
            .all(|(required, stock)| stock >= required)
}

/// Recomputes the availability flag for every listed menu item.
pub fn recompute_flags(
    menu_item_ids: &[i32],
    recipe_lines: &[MenuIngredientEntity],
    stocks: &HashMap<i32, f32>,
) -> HashMap<i32, bool> {
    let mut recipes: HashMap<i32, Vec<ResolvedLine>> = HashMap::new();
    for line in recipe_lines {
        let stock = stocks.get(&line.ingredient_id).copied().unwrap_or(0.0);
        recipes
            .entry(line.menu_item_id)
            .or_default()
            .push((line.quantity, stock));
    }

    menu_item_ids
        .iter()
        .map(|id| {
            let recipe = recipes.remove(id).unwrap_or_default();
            (*id, is_item_available(&recipe))
        })
        .collect()
}

#[derive(Serialize, Debug, Clone, Copy, ToSchema)]
pub struct SyncReport {
    pub total_items: usize,
    pub available: usize,
    pub unavailable: usize,
    pub changed: usize,
}

/// Walks the whole menu, recomputes every availability flag and persists the
/// ones that changed. Runs inside the caller's transaction when there is one.
pub async fn sync_menu_availability(conn: &mut AsyncPgConnection) -> Result<SyncReport> {
    let items: Vec<(i32, bool)> = menu_items::table
        .select((menu_items::id, menu_items::is_available))
        .get_results(conn)
        .await
        .context("Failed to get menu items")?;

    let recipe_lines: Vec<MenuIngredientEntity> = menu_ingredients::table
        .get_results(conn)
        .await
        .context("Failed to get recipe lines")?;

    let stocks: HashMap<i32, f32> = ingredients::table
        .select((ingredients::id, ingredients::stock))
        .get_results::<(i32, f32)>(conn)
        .await
        .context("Failed to get ingredient stocks")?
        .into_iter()
        .collect();

    let menu_item_ids: Vec<i32> = items.iter().map(|(id, _)| *id).collect();
    let flags = recompute_flags(&menu_item_ids, &recipe_lines, &stocks);

    let mut report = SyncReport {
        total_items: items.len(),
        available: 0,
        unavailable: 0,
        changed: 0,
    };

    for (id, was_available) in items {
        let now_available = flags.get(&id).copied().unwrap_or(false);
        if now_available {
            report.available += 1;
        } else {
            report.unavailable += 1;
        }

        if now_available != was_available {
            diesel::update(menu_items::table.find(id))
                .set((
                    menu_items::is_available.eq(now_available),
                    menu_items::updated_at.eq(diesel::dsl::now),
                ))
                .execute(conn)
                .await
                .context("Failed to update availability flag")?;
            report.changed += 1;
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn line(menu_item_id: i32, ingredient_id: i32, quantity: f32) -> MenuIngredientEntity {
        MenuIngredientEntity {
            menu_item_id,
            ingredient_id,
            quantity,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn item_without_recipe_is_unavailable() {
        assert!(!is_item_available(&[]));
    }

    #[test]
    fn item_is_unavailable_when_any_ingredient_is_short() {
        assert!(!is_item_available(&[(2.0, 10.0), (1.0, 0.5)]));
    }

    #[test]
    fn item_is_available_when_every_ingredient_suffices() {
        assert!(is_item_available(&[(2.0, 2.0), (0.5, 10.0)]));
    }

    #[test]
    fn recompute_covers_every_listed_item() {
        let lines = vec![line(1, 10, 2.0), line(1, 11, 1.0), line(2, 10, 5.0)];
        let stocks = HashMap::from([(10, 4.0), (11, 3.0)]);

        let flags = recompute_flags(&[1, 2, 3], &lines, &stocks);

        assert_eq!(flags.get(&1), Some(&true));
        // needs 5.0 of ingredient 10, only 4.0 on hand
        assert_eq!(flags.get(&2), Some(&false));
        // no recipe at all
        assert_eq!(flags.get(&3), Some(&false));
    }

    #[test]
    fn unknown_ingredient_counts_as_zero_stock() {
        let lines = vec![line(1, 99, 1.0)];
        let flags = recompute_flags(&[1], &lines, &HashMap::new());
        assert_eq!(flags.get(&1), Some(&false));
    }
}
