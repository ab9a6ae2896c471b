use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::schema::SchemaGraph;

/// Foreign-key edge the generation order leaves unresolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedEdge {
    pub table: String,
    pub column: String,
    pub referenced_table: String,
}

/// Compute the table generation order.
///
/// Tables are sorted by their number of foreign keys (fewest first), ties broken
/// lexicographically by name. This is a weak proxy for a topological sort: it
/// sequences strictly layered schemas correctly and never fails on cycles, but
/// tables with equal foreign-key counts that reference each other may come out
/// in the wrong order. Callers see such edges through [`unresolved_edges`] and
/// the synthesizer falls back to a bounded default key for them.
pub fn resolve_generation_order(schema: &SchemaGraph) -> Vec<String> {
    let mut ranked: Vec<(usize, &str)> = schema
        .tables
        .values()
        .map(|table| (table.foreign_keys.len(), table.name.as_str()))
        .collect();
    ranked.sort();
    ranked
        .into_iter()
        .map(|(_, name)| name.to_string())
        .collect()
}

/// Foreign-key edges whose referenced table is not generated strictly before
/// the referencing table (self references, cycles, equal-count mis-orderings).
///
/// References to tables missing from `order` are reported as well.
pub fn unresolved_edges(schema: &SchemaGraph, order: &[String]) -> Vec<UnresolvedEdge> {
    let position: HashMap<&str, usize> = order
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.as_str(), idx))
        .collect();

    let mut edges = Vec::new();
    for (table, column, referenced) in schema.edges() {
        let resolved = match (position.get(table), position.get(referenced)) {
            (Some(child), Some(parent)) => parent < child,
            _ => false,
        };
        if !resolved {
            edges.push(UnresolvedEdge {
                table: table.to_string(),
                column: column.to_string(),
                referenced_table: referenced.to_string(),
            });
        }
    }
    edges
}

/// Summary of FK graph structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FkGraphSummary {
    pub nodes: usize,
    pub edges: usize,
}

/// Exact dependency analysis of the FK graph, used for diagnostics only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FkGraphReport {
    pub summary: FkGraphSummary,
    pub topo_order: Option<Vec<String>>,
    pub cycle: Option<Vec<String>>,
}

/// Build a deterministic FK dependency report for a schema.
pub fn build_fk_graph_report(schema: &SchemaGraph) -> FkGraphReport {
    let graph = build_adjacency(schema);
    let nodes = graph.len();
    let edges = graph.values().map(BTreeSet::len).sum();
    let summary = FkGraphSummary { nodes, edges };

    match toposort(&graph) {
        Ok(order) => FkGraphReport {
            summary,
            topo_order: Some(order),
            cycle: None,
        },
        Err(cycle) => FkGraphReport {
            summary,
            topo_order: None,
            cycle: Some(cycle),
        },
    }
}

/// Parent table to the set of tables that reference it.
fn build_adjacency(schema: &SchemaGraph) -> BTreeMap<String, BTreeSet<String>> {
    let mut graph: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for name in schema.table_names() {
        graph.entry(name.to_string()).or_default();
    }
    for (table, _, referenced) in schema.edges() {
        graph
            .entry(referenced.to_string())
            .or_default()
            .insert(table.to_string());
    }

    graph
}

fn toposort(graph: &BTreeMap<String, BTreeSet<String>>) -> Result<Vec<String>, Vec<String>> {
    let mut indegree: BTreeMap<&str, usize> =
        graph.keys().map(|node| (node.as_str(), 0)).collect();
    for targets in graph.values() {
        for target in targets {
            *indegree.entry(target.as_str()).or_insert(0) += 1;
        }
    }

    let mut ready: BTreeSet<&str> = indegree
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(node, _)| *node)
        .collect();

    let mut order = Vec::with_capacity(graph.len());
    while let Some(node) = ready.pop_first() {
        order.push(node.to_string());

        if let Some(targets) = graph.get(node) {
            for target in targets {
                if let Some(count) = indegree.get_mut(target.as_str()) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        ready.insert(target.as_str());
                    }
                }
            }
        }
    }

    if order.len() == graph.len() {
        Ok(order)
    } else {
        Err(indegree
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|(node, _)| node.to_string())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnSpec, TableSpec};
    use crate::types::ColumnKind;

    fn int(name: &str) -> ColumnSpec {
        ColumnSpec::new(name, ColumnKind::Integer)
    }

    fn layered_schema() -> SchemaGraph {
        SchemaGraph::new()
            .with_table(
                TableSpec::new("rental")
                    .column(int("rental_id"))
                    .column(int("customer_id"))
                    .column(int("inventory_id"))
                    .primary_key(["rental_id"])
                    .foreign_key("customer_id", "customer")
                    .foreign_key("inventory_id", "inventory"),
            )
            .with_table(
                TableSpec::new("inventory")
                    .column(int("inventory_id"))
                    .column(int("film_id"))
                    .primary_key(["inventory_id"])
                    .foreign_key("film_id", "film"),
            )
            .with_table(
                TableSpec::new("customer")
                    .column(int("customer_id"))
                    .primary_key(["customer_id"]),
            )
            .with_table(TableSpec::new("film").column(int("film_id")).primary_key(["film_id"]))
    }

    #[test]
    fn orders_by_foreign_key_count_then_name() {
        let order = resolve_generation_order(&layered_schema());
        assert_eq!(order, vec!["customer", "film", "inventory", "rental"]);
    }

    #[test]
    fn order_is_deterministic() {
        let schema = layered_schema();
        assert_eq!(
            resolve_generation_order(&schema),
            resolve_generation_order(&schema)
        );
    }

    #[test]
    fn tolerates_self_references() {
        let schema = SchemaGraph::new().with_table(
            TableSpec::new("staff")
                .column(int("staff_id"))
                .column(int("manager_id"))
                .primary_key(["staff_id"])
                .foreign_key("manager_id", "staff"),
        );

        let order = resolve_generation_order(&schema);
        assert_eq!(order, vec!["staff"]);

        let unresolved = unresolved_edges(&schema, &order);
        assert_eq!(unresolved.len(), 1);
        assert_eq!(unresolved[0].column, "manager_id");
    }

    #[test]
    fn equal_count_mutual_references_stay_unresolved() {
        let schema = SchemaGraph::new()
            .with_table(
                TableSpec::new("a")
                    .column(int("id"))
                    .column(int("b_id"))
                    .primary_key(["id"])
                    .foreign_key("b_id", "b"),
            )
            .with_table(
                TableSpec::new("b")
                    .column(int("id"))
                    .column(int("a_id"))
                    .primary_key(["id"])
                    .foreign_key("a_id", "a"),
            );

        let order = resolve_generation_order(&schema);
        assert_eq!(order, vec!["a", "b"]);
        let unresolved = unresolved_edges(&schema, &order);
        assert_eq!(
            unresolved,
            vec![UnresolvedEdge {
                table: "a".to_string(),
                column: "b_id".to_string(),
                referenced_table: "b".to_string(),
            }]
        );
    }

    #[test]
    fn layered_schema_has_no_unresolved_edges() {
        let schema = layered_schema();
        let order = resolve_generation_order(&schema);
        assert!(unresolved_edges(&schema, &order).is_empty());
    }

    #[test]
    fn report_detects_cycles() {
        let schema = SchemaGraph::new().with_table(
            TableSpec::new("staff")
                .column(int("staff_id"))
                .column(int("manager_id"))
                .primary_key(["staff_id"])
                .foreign_key("manager_id", "staff"),
        );

        let report = build_fk_graph_report(&schema);
        assert!(report.topo_order.is_none());
        assert_eq!(report.cycle, Some(vec!["staff".to_string()]));
    }

    #[test]
    fn report_orders_parents_first() {
        let report = build_fk_graph_report(&layered_schema());
        let order = report.topo_order.expect("expected toposort");
        let film = order.iter().position(|item| item == "film").unwrap();
        let inventory = order.iter().position(|item| item == "inventory").unwrap();
        let rental = order.iter().position(|item| item == "rental").unwrap();
        assert!(film < inventory && inventory < rental);
        assert_eq!(report.summary.edges, 3);
    }
}
