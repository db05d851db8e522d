use std::collections::BTreeMap;
use std::f64::consts::TAU;

use log::debug;

use super::coords::CoordinateStore;
use super::types::{Relation, Service, ServiceId};

/// A relation whose two endpoints both name services in the current topology.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedRelation {
	pub source: ServiceId,
	pub target: ServiceId,
}

/// The part of a node's placement a relation line needs.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NodeBox {
	pub x: f64,
	pub y: f64,
	pub width: f64,
}

impl NodeBox {
	pub fn from_store(store: &CoordinateStore, id: &str) -> Option<Self> {
		let (x, y) = store.position(id)?;
		Some(Self {
			x,
			y,
			width: store.cached_size(id).width,
		})
	}

	fn anchor(&self) -> (f64, f64) {
		(self.x + self.width / 2.0, self.y)
	}
}

/// Peer relations and relations naming unknown services are skipped.
pub fn resolve_relations(services: &[Service], relations: &[Relation]) -> Vec<ResolvedRelation> {
	relations
		.iter()
		.filter_map(|rel| {
			let ids: Vec<&ServiceId> = rel
				.endpoints
				.iter()
				.filter_map(|ep| services.iter().find(|s| s.id == ep.0).map(|s| &s.id))
				.collect();
			match ids.as_slice() {
				[source, target] if source != target => Some(ResolvedRelation {
					source: (*source).clone(),
					target: (*target).clone(),
				}),
				_ => {
					debug!("skipping relation with endpoints {:?}", rel.endpoints);
					None
				}
			}
		})
		.collect()
}

/// Straight segment between the horizontal centers of the two nodes' top edges.
pub fn relation_endpoints(source: NodeBox, target: NodeBox) -> ((f64, f64), (f64, f64)) {
	(source.anchor(), target.anchor())
}

/// Polyline point list `"sx sy, tx ty"`.
// TODO: route around other services instead of drawing straight through them.
pub fn draw_relation(source: NodeBox, target: NodeBox) -> String {
	let ((sx, sy), (tx, ty)) = relation_endpoints(source, target);
	format!("{sx} {sy}, {tx} {ty}")
}

/// Parses a point list produced by [`draw_relation`] back into coordinates.
pub fn parse_points(points: &str) -> Vec<(f64, f64)> {
	points
		.split(',')
		.filter_map(|pair| {
			let mut it = pair.split_whitespace().map(str::parse::<f64>);
			match (it.next(), it.next()) {
				(Some(Ok(x)), Some(Ok(y))) => Some((x, y)),
				_ => None,
			}
		})
		.collect()
}

/// One wedge of the aggregated-status chart.
#[derive(Clone, Debug, PartialEq)]
pub struct PieSlice {
	pub name: String,
	pub start_angle: f64,
	pub end_angle: f64,
}

/// Largest count first, clockwise from twelve o'clock. A zero count still gets
/// the weight of one unit so every reported status stays visible.
pub fn pie_slices(status: &BTreeMap<String, u32>) -> Vec<PieSlice> {
	let mut items: Vec<(&String, f64)> = status
		.iter()
		.map(|(name, &count)| (name, if count == 0 { 1.0 } else { count as f64 }))
		.collect();
	items.sort_by(|a, b| b.1.total_cmp(&a.1));
	let total: f64 = items.iter().map(|(_, v)| v).sum();

	let mut angle = 0.0;
	items
		.into_iter()
		.map(|(name, value)| {
			let sweep = value / total * TAU;
			let slice = PieSlice {
				name: name.clone(),
				start_angle: angle,
				end_angle: angle + sweep,
			};
			angle += sweep;
			slice
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::environment::types::Endpoint;

	fn svc(id: &str) -> Service {
		Service {
			id: id.into(),
			..Service::default()
		}
	}

	fn rel(ids: &[&str]) -> Relation {
		Relation {
			endpoints: ids.iter().map(|id| Endpoint((*id).into(), "role".into())).collect(),
		}
	}

	#[test]
	fn draws_between_horizontal_centers() {
		let source = NodeBox { x: 10.0, y: 20.0, width: 100.0 };
		let target = NodeBox { x: 200.0, y: 50.0, width: 80.0 };
		assert_eq!(draw_relation(source, target), "60 20, 240 50");
	}

	#[test]
	fn point_list_parses() {
		assert_eq!(parse_points("60 20, 240.5 50"), vec![(60.0, 20.0), (240.5, 50.0)]);
		assert!(parse_points("").is_empty());
	}

	#[test]
	fn pie_orders_by_count_and_covers_the_circle() {
		let status = BTreeMap::from([
			("pending".to_string(), 1),
			("running".to_string(), 3),
			("error".to_string(), 0),
		]);
		let slices = pie_slices(&status);
		assert_eq!(slices[0].name, "running");
		assert!((slices[0].end_angle - 0.6 * TAU).abs() < 1e-9);
		assert!((slices.last().unwrap().end_angle - TAU).abs() < 1e-9);
		assert_eq!(slices.len(), 3);
		assert!(pie_slices(&BTreeMap::new()).is_empty());
	}

	#[test]
	fn peer_relations_are_not_drawn() {
		let services = vec![svc("a"), svc("b"), svc("c")];
		let relations = vec![rel(&["a", "b"]), rel(&["c"])];
		let resolved = resolve_relations(&services, &relations);
		assert_eq!(
			resolved,
			vec![ResolvedRelation { source: "a".into(), target: "b".into() }]
		);
	}

	#[test]
	fn unknown_and_self_endpoints_are_skipped() {
		let services = vec![svc("a"), svc("b")];
		let relations = vec![rel(&["a", "gone"]), rel(&["a", "a"]), rel(&["a", "b", "b"])];
		assert!(resolve_relations(&services, &relations).is_empty());
	}
}
