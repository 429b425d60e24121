//! Built-in layered SVG layout
//!
//! A small Sugiyama-style drawing for machines without Graphviz: nodes are
//! assigned to layers by longest path from the roots, laid out in entity
//! order within each layer, and edges are straight lines clipped to the node
//! outline. Cycles are tolerated; layer assignment stops once no layer can
//! grow past the node count.

use std::collections::HashMap;
use std::fmt::Write as _;
use youtwo_core::{GraphResult, GraphSnapshot, VisualizationConfig};

const NODE_HEIGHT: f64 = 36.0;
const MIN_NODE_WIDTH: f64 = 60.0;
const CHAR_WIDTH: f64 = 7.5;
const LABEL_PADDING: f64 = 24.0;
const LAYER_GAP: f64 = 70.0;
const NODE_GAP: f64 = 30.0;
const MARGIN: f64 = 40.0;

#[derive(Debug, Clone, Copy)]
struct Placed {
    x: f64,
    y: f64,
    rx: f64,
    ry: f64,
}

/// Direction of the layer axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Orientation {
    TopBottom,
    BottomTop,
    LeftRight,
    RightLeft,
}

impl Orientation {
    fn parse(rankdir: &str) -> Self {
        match rankdir.to_ascii_uppercase().as_str() {
            "BT" => Orientation::BottomTop,
            "LR" => Orientation::LeftRight,
            "RL" => Orientation::RightLeft,
            _ => Orientation::TopBottom,
        }
    }

    fn horizontal(self) -> bool {
        matches!(self, Orientation::LeftRight | Orientation::RightLeft)
    }

    fn reversed(self) -> bool {
        matches!(self, Orientation::BottomTop | Orientation::RightLeft)
    }
}

/// Render a snapshot as a standalone SVG document
pub fn to_svg(snapshot: &GraphSnapshot, config: &VisualizationConfig) -> GraphResult<String> {
    snapshot.check_endpoints()?;

    let index: HashMap<&str, usize> = snapshot
        .entities
        .iter()
        .enumerate()
        .map(|(i, e)| (e.name.as_str(), i))
        .collect();
    let edges: Vec<(usize, usize, &str)> = snapshot
        .relations
        .iter()
        .filter_map(|r| {
            Some((
                *index.get(r.source.as_str())?,
                *index.get(r.target.as_str())?,
                r.relation_type.as_str(),
            ))
        })
        .collect();

    let widths: Vec<f64> = snapshot
        .entities
        .iter()
        .map(|e| (e.name.chars().count() as f64 * CHAR_WIDTH + LABEL_PADDING).max(MIN_NODE_WIDTH))
        .collect();

    let layers = assign_layers(snapshot.entities.len(), &edges);
    let orientation = Orientation::parse(&config.rankdir);
    let (placed, width, height) = place(&layers, &widths, orientation);

    let boxy = matches!(
        config.node_shape.to_ascii_lowercase().as_str(),
        "box" | "rect" | "rectangle" | "square"
    );
    let filled = config.node_style.contains("filled");

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w:.0}" height="{h:.0}" viewBox="0 0 {w:.0} {h:.0}" font-family="Helvetica, Arial, sans-serif">"#,
        w = width,
        h = height
    );
    svg.push_str("  <title>knowledge_graph</title>\n");
    svg.push_str(
        "  <defs>\n    <marker id=\"arrow\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" \
         markerWidth=\"8\" markerHeight=\"8\" orient=\"auto-start-reverse\">\n      \
         <path d=\"M 0 0 L 10 5 L 0 10 z\" fill=\"black\"/>\n    </marker>\n  </defs>\n",
    );
    svg.push_str("  <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");

    svg.push_str("  <g class=\"edges\">\n");
    for &(s, t, label) in &edges {
        write_edge(&mut svg, placed[s], placed[t], s == t, label, boxy);
    }
    svg.push_str("  </g>\n");

    svg.push_str("  <g class=\"nodes\">\n");
    for (i, entity) in snapshot.entities.iter().enumerate() {
        let p = placed[i];
        let fill = if filled {
            config.entity_color(&entity.entity_type)
        } else {
            "white"
        };
        let _ = writeln!(svg, "    <g class=\"node\"><title>{}</title>", escape_xml(&entity.name));
        if boxy {
            let _ = writeln!(
                svg,
                r#"      <rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}" stroke="black"/>"#,
                p.x - p.rx,
                p.y - p.ry,
                p.rx * 2.0,
                p.ry * 2.0,
                escape_xml(fill)
            );
        } else {
            let _ = writeln!(
                svg,
                r#"      <ellipse cx="{:.1}" cy="{:.1}" rx="{:.1}" ry="{:.1}" fill="{}" stroke="black"/>"#,
                p.x,
                p.y,
                p.rx,
                p.ry,
                escape_xml(fill)
            );
        }
        let _ = writeln!(
            svg,
            r#"      <text x="{:.1}" y="{:.1}" text-anchor="middle" dominant-baseline="central" font-size="14">{}</text>"#,
            p.x,
            p.y,
            escape_xml(&entity.name)
        );
        svg.push_str("    </g>\n");
    }
    svg.push_str("  </g>\n</svg>\n");

    Ok(svg)
}

/// Longest-path layering, bounded by the node count so cycles terminate
fn assign_layers(count: usize, edges: &[(usize, usize, &str)]) -> Vec<Vec<usize>> {
    let mut layer = vec![0usize; count];
    for _ in 0..count {
        let mut changed = false;
        for &(s, t, _) in edges {
            if s != t && layer[t] <= layer[s] && layer[s] + 1 < count {
                layer[t] = layer[s] + 1;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    let depth = layer.iter().copied().max().map_or(0, |d| d + 1);
    let mut layers: Vec<Vec<usize>> = vec![Vec::new(); depth];
    for (node, l) in layer.into_iter().enumerate() {
        layers[l].push(node);
    }
    layers.retain(|l| !l.is_empty());
    layers
}

/// Node centers plus total canvas size
fn place(layers: &[Vec<usize>], widths: &[f64], orientation: Orientation) -> (Vec<Placed>, f64, f64) {
    let mut placed = vec![
        Placed {
            x: 0.0,
            y: 0.0,
            rx: MIN_NODE_WIDTH / 2.0,
            ry: NODE_HEIGHT / 2.0,
        };
        widths.len()
    ];
    if layers.is_empty() {
        return (placed, MARGIN * 2.0, MARGIN * 2.0);
    }

    // Extent of a node along the layer axis and across it
    let main_size = |n: usize| if orientation.horizontal() { widths[n] } else { NODE_HEIGHT };
    let cross_size = |n: usize| if orientation.horizontal() { NODE_HEIGHT } else { widths[n] };

    let layer_main: Vec<f64> = layers
        .iter()
        .map(|l| l.iter().map(|&n| main_size(n)).fold(0.0, f64::max))
        .collect();
    let layer_cross: Vec<f64> = layers
        .iter()
        .map(|l| l.iter().map(|&n| cross_size(n)).sum::<f64>() + NODE_GAP * (l.len() - 1) as f64)
        .collect();

    let total_main = layer_main.iter().sum::<f64>() + LAYER_GAP * (layers.len() - 1) as f64;
    let total_cross = layer_cross.iter().copied().fold(0.0, f64::max);

    let mut main_offset = 0.0;
    for (li, layer) in layers.iter().enumerate() {
        let main_center = main_offset + layer_main[li] / 2.0;
        let main = if orientation.reversed() {
            total_main - main_center
        } else {
            main_center
        };

        let mut cross = (total_cross - layer_cross[li]) / 2.0;
        for &n in layer {
            let cross_center = cross + cross_size(n) / 2.0;
            let (x, y) = if orientation.horizontal() {
                (main, cross_center)
            } else {
                (cross_center, main)
            };
            placed[n] = Placed {
                x: x + MARGIN,
                y: y + MARGIN,
                rx: widths[n] / 2.0,
                ry: NODE_HEIGHT / 2.0,
            };
            cross += cross_size(n) + NODE_GAP;
        }
        main_offset += layer_main[li] + LAYER_GAP;
    }

    let (w, h) = if orientation.horizontal() {
        (total_main, total_cross)
    } else {
        (total_cross, total_main)
    };
    // extra room on the right for self-loop labels
    (placed, w + MARGIN * 2.0 + 60.0, h + MARGIN * 2.0)
}

fn write_edge(svg: &mut String, from: Placed, to: Placed, self_loop: bool, label: &str, boxy: bool) {
    let label = escape_xml(label);

    if self_loop {
        let (x, y) = (from.x + from.rx * 0.7, from.y);
        let _ = writeln!(
            svg,
            r#"    <path d="M {:.1} {:.1} C {:.1} {:.1} {:.1} {:.1} {:.1} {:.1}" fill="none" stroke="black" marker-end="url(#arrow)"/>"#,
            x,
            y - from.ry * 0.7,
            from.x + from.rx + 30.0,
            y - from.ry - 20.0,
            from.x + from.rx + 30.0,
            y + from.ry + 20.0,
            x,
            y + from.ry * 0.7
        );
        let _ = writeln!(
            svg,
            r#"    <text x="{:.1}" y="{:.1}" font-size="10" dominant-baseline="central">{}</text>"#,
            from.x + from.rx + 34.0,
            y,
            label
        );
        return;
    }

    let (dx, dy) = (to.x - from.x, to.y - from.y);
    let start = boundary(from, dx, dy, boxy);
    let end = boundary(to, -dx, -dy, boxy);
    let _ = writeln!(
        svg,
        r#"    <line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="black" marker-end="url(#arrow)"/>"#,
        start.0, start.1, end.0, end.1
    );
    let _ = writeln!(
        svg,
        r#"    <text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="10" fill="dimgray">{}</text>"#,
        (start.0 + end.0) / 2.0,
        (start.1 + end.1) / 2.0 - 4.0,
        label
    );
}

/// Point where the ray from the node center along `(dx, dy)` leaves the outline
fn boundary(node: Placed, dx: f64, dy: f64, boxy: bool) -> (f64, f64) {
    if dx == 0.0 && dy == 0.0 {
        return (node.x, node.y);
    }
    let t = if boxy {
        let tx = if dx == 0.0 { f64::INFINITY } else { node.rx / dx.abs() };
        let ty = if dy == 0.0 { f64::INFINITY } else { node.ry / dy.abs() };
        tx.min(ty)
    } else {
        1.0 / ((dx / node.rx).powi(2) + (dy / node.ry).powi(2)).sqrt()
    };
    (node.x + dx * t, node.y + dy * t)
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use youtwo_core::{Entity, Relation};

    fn chain() -> GraphSnapshot {
        GraphSnapshot::new(
            vec![
                Entity::new("A", "concept"),
                Entity::new("B", "person"),
                Entity::new("C", "event"),
            ],
            vec![Relation::new("A", "B", "r1"), Relation::new("B", "C", "r2")],
        )
    }

    #[test]
    fn test_layers_follow_longest_path() {
        let edges = vec![(0, 1, "x"), (1, 2, "x"), (0, 2, "x")];
        assert_eq!(assign_layers(3, &edges), vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn test_layering_terminates_on_cycles() {
        let edges = vec![(0, 1, "x"), (1, 2, "x"), (2, 0, "x")];
        let layers = assign_layers(3, &edges);
        assert_eq!(layers.iter().map(Vec::len).sum::<usize>(), 3);
    }

    #[test]
    fn test_isolated_nodes_share_first_layer() {
        assert_eq!(assign_layers(2, &[]), vec![vec![0, 1]]);
        assert!(assign_layers(0, &[]).is_empty());
    }

    #[test]
    fn test_svg_contains_nodes_edges_and_colors() {
        let svg = to_svg(&chain(), &VisualizationConfig::default()).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("<ellipse").count(), 3);
        assert_eq!(svg.matches("<line").count(), 2);
        assert!(svg.contains("fill=\"lightpink\""));
        assert!(svg.contains("fill=\"lightblue\""));
        assert!(svg.contains("fill=\"lightcoral\""));
        assert!(svg.contains(">r1</text>"));
    }

    #[test]
    fn test_top_bottom_stacks_layers_vertically() {
        let (placed, _, _) = place(
            &[vec![0], vec![1]],
            &[MIN_NODE_WIDTH, MIN_NODE_WIDTH],
            Orientation::TopBottom,
        );
        assert!(placed[0].y < placed[1].y);
        assert_eq!(placed[0].x, placed[1].x);

        let (placed, _, _) = place(
            &[vec![0], vec![1]],
            &[MIN_NODE_WIDTH, MIN_NODE_WIDTH],
            Orientation::RightLeft,
        );
        assert!(placed[0].x > placed[1].x);
    }

    #[test]
    fn test_box_shape_and_self_loop() {
        let snapshot = GraphSnapshot::new(
            vec![Entity::new("Joey", "person")],
            vec![Relation::new("Joey", "Joey", "likes")],
        );
        let config = VisualizationConfig {
            node_shape: "box".to_string(),
            ..Default::default()
        };
        let svg = to_svg(&snapshot, &config).unwrap();
        assert!(svg.contains("<rect x="));
        assert!(svg.contains("<path d=\"M"));
        assert!(svg.contains(">likes</text>"));
    }

    #[test]
    fn test_labels_are_xml_escaped() {
        let snapshot = GraphSnapshot::new(vec![Entity::new("Tom & <Jerry>", "")], vec![]);
        let svg = to_svg(&snapshot, &VisualizationConfig::default()).unwrap();
        assert!(svg.contains("Tom &amp; &lt;Jerry&gt;"));
        assert!(svg.contains("fill=\"lightgray\""));
    }

    #[test]
    fn test_empty_snapshot_is_valid_svg() {
        let svg = to_svg(&GraphSnapshot::default(), &VisualizationConfig::default()).unwrap();
        assert!(svg.contains("<g class=\"nodes\">"));
        assert!(!svg.contains("<ellipse"));
    }
}
