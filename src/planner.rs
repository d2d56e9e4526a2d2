//! Dependency-aware deletion planning.
//!
//! Turns the discovered tables and foreign-key relationships into layers of
//! tables that can be emptied without violating a foreign key. Each pass peels
//! off the tables nothing else references (the leaves); the referenced tables
//! become leaves once their children are gone. When every remaining table is
//! referenced, the graph has a cycle: under [`CyclePolicy::DisableConstraints`]
//! the remaining constraints are disabled and the remaining tables form one
//! final layer.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::PlanError;
use crate::schema::{Constraint, Relationship, TableName};

/// What to do when no table in the remaining set is free of dependents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePolicy {
    /// Disable the constraints of the cycle and delete the tables together.
    #[default]
    DisableConstraints,
    /// Fail with [`PlanError::CircularDependency`].
    Reject,
}

/// The result of planning: ordered layers plus constraints to disable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionPlan {
    /// Tables grouped by pass, outermost dependents first. Tables inside a
    /// layer can be deleted in any order.
    pub layers: Vec<Vec<TableName>>,
    /// Constraints that must be disabled before deleting, in first-seen order.
    pub foreign_keys_to_disable: Vec<Constraint>,
}

impl DeletionPlan {
    /// All tables in deletion order.
    pub fn tables_to_delete(&self) -> impl Iterator<Item = &TableName> + '_ {
        self.layers.iter().flatten()
    }

    /// Index of the layer holding `table`, if planned.
    pub fn layer_of(&self, table: &TableName) -> Option<usize> {
        self.layers.iter().position(|layer| layer.contains(table))
    }

    pub fn table_count(&self) -> usize {
        self.layers.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

/// Plan the deletion of `tables` given the foreign keys between them.
///
/// `tables` must not contain duplicates. Relationships with an end outside
/// `tables` are ignored. The result is a pure function of the inputs and
/// preserves their order.
pub fn plan(
    tables: &[TableName],
    relationships: &[Relationship],
    policy: CyclePolicy,
) -> Result<DeletionPlan, PlanError> {
    let known: HashSet<&TableName> = tables.iter().collect();

    let edges: Vec<&Relationship> = relationships
        .iter()
        .filter(|rel| !rel.is_self_referencing())
        .filter(|rel| {
            let inside =
                known.contains(&rel.primary_key_table) && known.contains(&rel.foreign_key_table);
            if !inside {
                tracing::warn!(
                    parent = %rel.primary_key_table,
                    child = %rel.foreign_key_table,
                    constraint = %rel.constraint.name,
                    "relationship references an unplanned table, skipping"
                );
            }
            inside
        })
        .collect();

    let remaining: Vec<&TableName> = tables.iter().collect();
    let peeled = peel(&remaining, &edges, policy)?;

    tracing::debug!(
        tables = tables.len(),
        layers = peeled.layers.len(),
        disabled = peeled.disabled.len(),
        "deletion plan built"
    );

    Ok(DeletionPlan {
        layers: peeled.layers,
        foreign_keys_to_disable: peeled.disabled,
    })
}

/// Layers and disabled constraints produced from one pass onward.
struct Peeled {
    layers: Vec<Vec<TableName>>,
    disabled: Vec<Constraint>,
}

fn peel(
    tables: &[&TableName],
    edges: &[&Relationship],
    policy: CyclePolicy,
) -> Result<Peeled, PlanError> {
    if tables.is_empty() {
        return Ok(Peeled {
            layers: Vec::new(),
            disabled: Vec::new(),
        });
    }

    let referenced: HashSet<&TableName> = edges.iter().map(|rel| &rel.primary_key_table).collect();
    let leaves: Vec<&TableName> = tables
        .iter()
        .copied()
        .filter(|table| !referenced.contains(table))
        .collect();

    if leaves.is_empty() {
        // Every remaining table is referenced by another remaining table.
        let cyclic: Vec<TableName> = tables.iter().map(|t| (*t).clone()).collect();
        return match policy {
            CyclePolicy::Reject => Err(PlanError::CircularDependency { tables: cyclic }),
            CyclePolicy::DisableConstraints => {
                let mut seen = HashSet::new();
                let disabled: Vec<Constraint> = edges
                    .iter()
                    .map(|rel| &rel.constraint)
                    .filter(|constraint| seen.insert(*constraint))
                    .cloned()
                    .collect();
                tracing::info!(
                    tables = cyclic.len(),
                    constraints = disabled.len(),
                    "circular foreign keys, disabling constraints"
                );
                Ok(Peeled {
                    layers: vec![cyclic],
                    disabled,
                })
            }
        };
    }

    let layer: Vec<TableName> = leaves.iter().map(|t| (*t).clone()).collect();
    if referenced.is_empty() {
        return Ok(Peeled {
            layers: vec![layer],
            disabled: Vec::new(),
        });
    }

    let removed: HashSet<&TableName> = leaves.into_iter().collect();
    let rest_tables: Vec<&TableName> = tables
        .iter()
        .copied()
        .filter(|table| !removed.contains(table))
        .collect();
    let rest_edges: Vec<&Relationship> = edges
        .iter()
        .copied()
        .filter(|rel| !removed.contains(&rel.foreign_key_table))
        .collect();

    let rest = peel(&rest_tables, &rest_edges, policy)?;
    let mut layers = Vec::with_capacity(rest.layers.len() + 1);
    layers.push(layer);
    layers.extend(rest.layers);
    Ok(Peeled {
        layers,
        disabled: rest.disabled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(name: &str) -> TableName {
        TableName::new("dbo", name)
    }

    /// Relationship where `child` holds a foreign key to `parent`.
    fn fk(parent: &str, child: &str) -> Relationship {
        Relationship::new(t(parent), t(child), format!("fk_{child}_{parent}"))
    }

    fn names(layer: &[TableName]) -> Vec<&str> {
        layer.iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn no_relationships_is_one_layer_in_input_order() {
        let tables = vec![t("t1"), t("t2"), t("t3")];
        let plan = plan(&tables, &[], CyclePolicy::default()).unwrap();
        assert_eq!(plan.layers.len(), 1);
        assert_eq!(names(&plan.layers[0]), vec!["t1", "t2", "t3"]);
        assert!(plan.foreign_keys_to_disable.is_empty());
    }

    #[test]
    fn empty_input_is_empty_plan() {
        let plan = plan(&[], &[], CyclePolicy::default()).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.table_count(), 0);
    }

    #[test]
    fn children_are_deleted_before_parents() {
        let tables = vec![t("orders"), t("order_items")];
        let plan = plan(&tables, &[fk("orders", "order_items")], CyclePolicy::default()).unwrap();
        let order: Vec<&str> = plan.tables_to_delete().map(|t| t.name.as_str()).collect();
        assert_eq!(order, vec!["order_items", "orders"]);
        assert!(plan.foreign_keys_to_disable.is_empty());
    }

    #[test]
    fn chain_produces_one_layer_per_level() {
        let tables = vec![t("customers"), t("orders"), t("order_items"), t("products")];
        let rels = vec![
            fk("customers", "orders"),
            fk("orders", "order_items"),
            fk("products", "order_items"),
        ];
        let plan = plan(&tables, &rels, CyclePolicy::default()).unwrap();
        assert_eq!(plan.layers.len(), 3);
        assert_eq!(names(&plan.layers[0]), vec!["order_items"]);
        assert_eq!(names(&plan.layers[1]), vec!["orders", "products"]);
        assert_eq!(names(&plan.layers[2]), vec!["customers"]);
    }

    #[test]
    fn pure_cycle_is_one_layer_with_all_constraints_disabled() {
        let tables = vec![t("a"), t("b"), t("c")];
        let rels = vec![fk("b", "a"), fk("c", "b"), fk("a", "c")];
        let plan = plan(&tables, &rels, CyclePolicy::DisableConstraints).unwrap();
        assert_eq!(plan.layers.len(), 1);
        assert_eq!(names(&plan.layers[0]), vec!["a", "b", "c"]);
        assert_eq!(plan.foreign_keys_to_disable.len(), 3);
    }

    #[test]
    fn cycle_behind_a_leaf_is_peeled_after_it() {
        let tables = vec![t("a"), t("b"), t("audit")];
        let rels = vec![fk("b", "a"), fk("a", "b"), fk("a", "audit")];
        let plan = plan(&tables, &rels, CyclePolicy::default()).unwrap();
        assert_eq!(plan.layers.len(), 2);
        assert_eq!(names(&plan.layers[0]), vec!["audit"]);
        assert_eq!(names(&plan.layers[1]), vec!["a", "b"]);
        let disabled: Vec<&str> = plan
            .foreign_keys_to_disable
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(disabled, vec!["fk_a_b", "fk_b_a"]);
    }

    #[test]
    fn reject_policy_names_cyclic_tables() {
        let tables = vec![t("leaf"), t("a"), t("b")];
        let rels = vec![fk("b", "a"), fk("a", "b")];
        let err = plan(&tables, &rels, CyclePolicy::Reject).unwrap_err();
        let PlanError::CircularDependency { tables } = err;
        assert_eq!(names(&tables), vec!["a", "b"]);
    }

    #[test]
    fn self_references_never_disable_or_order() {
        let tables = vec![t("employees"), t("departments")];
        let rels = vec![fk("employees", "employees"), fk("departments", "employees")];
        let plan = plan(&tables, &rels, CyclePolicy::default()).unwrap();
        assert_eq!(names(&plan.layers[0]), vec!["employees"]);
        assert_eq!(names(&plan.layers[1]), vec!["departments"]);
        assert!(plan.foreign_keys_to_disable.is_empty());
    }

    #[test]
    fn self_reference_inside_cycle_is_not_disabled() {
        let tables = vec![t("a"), t("b")];
        let rels = vec![fk("a", "a"), fk("b", "a"), fk("a", "b")];
        let plan = plan(&tables, &rels, CyclePolicy::default()).unwrap();
        assert!(plan
            .foreign_keys_to_disable
            .iter()
            .all(|c| c.name != "fk_a_a"));
        assert_eq!(plan.foreign_keys_to_disable.len(), 2);
    }

    #[test]
    fn duplicate_constraints_collapse() {
        let tables = vec![t("a"), t("b")];
        let rels = vec![fk("b", "a"), fk("b", "a"), fk("a", "b")];
        let plan = plan(&tables, &rels, CyclePolicy::default()).unwrap();
        assert_eq!(plan.foreign_keys_to_disable.len(), 2);
    }

    #[test]
    fn relationships_to_unplanned_tables_are_ignored() {
        let tables = vec![t("orders")];
        let rels = vec![fk("orders", "order_items"), fk("customers", "orders")];
        let plan = plan(&tables, &rels, CyclePolicy::default()).unwrap();
        assert_eq!(plan.layers, vec![vec![t("orders")]]);
        assert!(plan.foreign_keys_to_disable.is_empty());
    }

    #[test]
    fn every_table_planned_once_and_children_precede_parents() {
        let tables: Vec<TableName> = ["a", "b", "c", "d", "e", "f", "g"].map(t).to_vec();
        let rels = vec![
            fk("a", "b"),
            fk("a", "c"),
            fk("b", "d"),
            fk("c", "d"),
            fk("e", "f"),
            fk("f", "e"),
            fk("e", "g"),
            fk("d", "d"),
        ];
        let plan = plan(&tables, &rels, CyclePolicy::default()).unwrap();

        let planned: Vec<&TableName> = plan.tables_to_delete().collect();
        assert_eq!(planned.len(), tables.len());
        let unique: HashSet<&TableName> = planned.iter().copied().collect();
        assert_eq!(unique.len(), tables.len());

        for rel in rels.iter().filter(|r| !r.is_self_referencing()) {
            if plan.foreign_keys_to_disable.contains(&rel.constraint) {
                continue;
            }
            let child = plan.layer_of(&rel.foreign_key_table).unwrap();
            let parent = plan.layer_of(&rel.primary_key_table).unwrap();
            assert!(child < parent, "{} must precede {}", rel.foreign_key_table, rel.primary_key_table);
        }
    }

    #[test]
    fn planning_is_deterministic() {
        let tables: Vec<TableName> = ["x", "y", "z", "w"].map(t).to_vec();
        let rels = vec![fk("x", "y"), fk("y", "z"), fk("z", "y"), fk("w", "x")];
        let first = plan(&tables, &rels, CyclePolicy::default()).unwrap();
        let second = plan(&tables, &rels, CyclePolicy::default()).unwrap();
        assert_eq!(first, second);
    }
}
