//! Rerooting and the pairwise order of a progressive alignment.

use crate::invalid_input;
use crate::tree::newick::GuideTree;
use eyre::Report;

impl GuideTree {
  /// Index of the node with the given label.
  pub fn find_node(&self, label: &str) -> Option<usize> {
    self.nodes.iter().position(|node| node.label == label)
  }

  /// Re-root the tree at the parent of the named leaf, making that leaf an
  /// outgroup. Parent links along the path from the new root to the old one
  /// are reversed and each reversed edge takes over the length of the edge
  /// above it; all other edges are untouched, so the unrooted topology is
  /// preserved.
  pub fn reroot(&mut self, outgroup: &str) -> Result<(), Report> {
    let leaf = match self.find_node(outgroup) {
      Some(index) => index,
      None => return invalid_input!("outgroup label '{outgroup}' not found, re-root failed"),
    };

    // ancestors from the new root up to and including the current root
    let new_root = self.nodes[leaf].parent;
    let mut ancestors = vec![new_root];
    let mut node = new_root;
    while self.nodes[node].parent != node {
      node = self.nodes[node].parent;
      ancestors.push(node);
    }

    // reverse parent -> descendant along the path, shifting edge lengths
    for i in (1..ancestors.len()).rev() {
      self.nodes[ancestors[i]].parent = ancestors[i - 1];
      self.nodes[ancestors[i]].length = self.nodes[ancestors[i - 1]].length;
    }
    self.nodes[new_root].parent = new_root;
    self.nodes[new_root].length = 0.0;

    self.rebuild_children();
    Ok(())
  }

  /// Total branch length from the reference leaf to a node. The tree must
  /// already be rooted at the reference's parent.
  pub fn distance_to_reference(&self, reference: usize, node: usize) -> f64 {
    let mut distance = 0.0;
    let mut current = node;
    while self.nodes[current].parent != current {
      distance += self.nodes[current].length;
      current = self.nodes[current].parent;
    }
    distance + self.nodes[reference].length
  }

  /// Leaf order for the progressive walk: the cheapest pair of leaf siblings
  /// seeds the alignment, then leaves are visited siblings-first, descending
  /// into one unvisited internal node at a time while accumulating the edge
  /// length travelled. Each entry is `(leaf_index, branch_to_previous)`.
  pub fn alignment_order(&self) -> Vec<(usize, f64)> {
    let mut order = Vec::new();

    // seed: the pair of sibling leaves with minimal summed branch length
    let mut closest: Option<(usize, usize)> = None;
    let mut closest_distance = f64::MAX;
    for node in &self.nodes {
      for (slot, &a) in node.children.iter().enumerate() {
        for &b in &node.children[slot + 1..] {
          if !(self.nodes[a].is_leaf && self.nodes[b].is_leaf) {
            continue;
          }
          let distance = self.nodes[a].length + self.nodes[b].length;
          if distance < closest_distance {
            closest_distance = distance;
            closest = Some((a, b));
          }
        }
      }
    }
    let (first, second) = match closest {
      Some(pair) => pair,
      None => return order,
    };
    order.push((first, 0.0));
    order.push((second, closest_distance));

    let mut visited = vec![false; self.nodes.len()];
    visited[first] = true;
    visited[second] = true;
    let mut ancestor = self.nodes[second].parent;
    let mut branch = 0.0;

    while visited.iter().any(|seen| !seen) {
      // pick up unvisited sibling leaves first
      for child in self.nodes[ancestor].children.clone() {
        if !visited[child] && self.nodes[child].is_leaf {
          visited[child] = true;
          order.push((child, self.nodes[child].length + branch));
          branch = 0.0;
        }
      }

      let unvisited_inode = self.nodes[ancestor]
        .children
        .iter()
        .copied()
        .find(|child| !visited[*child] && !self.nodes[*child].is_leaf);

      if self.nodes[ancestor].children.iter().any(|c| !visited[*c]) {
        // descend into an unvisited internal child
        if let Some(node) = unvisited_inode {
          ancestor = node;
          visited[node] = true;
          branch += self.nodes[node].length;
        }
      } else {
        // everything below is done, climb back up
        visited[ancestor] = true;
        branch += self.nodes[ancestor].length;
        ancestor = self.nodes[ancestor].parent;
      }
    }

    order
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::tree::newick::parse_newick;
  use approx::assert_abs_diff_eq;
  use pretty_assertions::assert_eq;

  const FIVE_TAXA: &str = "(B_b:6.0,(A-a:5.0,C/c:3.0,E.e:4.0)Ancestor:5.0,D%:11.0);";

  const MAMMALS: &str = "((raccoon:19.2,bear:6.8):0.8,((sea_lion:12.0,seal:12.0):7.5,\
     ((monkey:100.9,cat:47.1):20.6,weasel:18.9):2.1):3.9,dog:25.5);";

  #[test]
  fn reroot_at_leaf_of_a_shallow_clade() {
    let mut tree = parse_newick(FIVE_TAXA).unwrap();
    tree.reroot("A-a").unwrap();

    assert_abs_diff_eq!(tree.nodes[0].length, 5.0);
    assert_eq!(tree.nodes[0].parent, 2);
    assert_abs_diff_eq!(tree.nodes[1].length, 6.0);
    assert_eq!(tree.nodes[1].parent, 0);
    assert_abs_diff_eq!(tree.nodes[2].length, 0.0);
    assert_eq!(tree.nodes[2].parent, 2);
    assert_abs_diff_eq!(tree.nodes[3].length, 5.0);
    assert_eq!(tree.nodes[3].parent, 2);
    assert_abs_diff_eq!(tree.nodes[4].length, 3.0);
    assert_eq!(tree.nodes[4].parent, 2);
    assert_abs_diff_eq!(tree.nodes[5].length, 4.0);
    assert_eq!(tree.nodes[5].parent, 2);
    assert_abs_diff_eq!(tree.nodes[6].length, 11.0);
    assert_eq!(tree.nodes[6].parent, 0);
  }

  #[test]
  fn reroot_walks_a_deep_path() {
    let mut tree = parse_newick(MAMMALS).unwrap();
    tree.reroot("cat").unwrap();

    assert_eq!(tree.nodes[0].parent, 4);
    assert_abs_diff_eq!(tree.nodes[0].length, 3.9, epsilon = 1e-9);
    assert_eq!(tree.nodes[4].parent, 8);
    assert_abs_diff_eq!(tree.nodes[4].length, 2.1, epsilon = 1e-9);
    assert_eq!(tree.nodes[8].parent, 9);
    assert_abs_diff_eq!(tree.nodes[8].length, 20.6, epsilon = 1e-9);
    assert_eq!(tree.nodes[9].parent, 9);
    assert_abs_diff_eq!(tree.nodes[9].length, 0.0);
  }

  #[test]
  fn reroot_preserves_off_path_edges_and_topology() {
    let original = parse_newick(MAMMALS).unwrap();
    let mut tree = original.clone();
    tree.reroot("cat").unwrap();
    // leaves keep their pendant edge lengths
    for index in original.leaves() {
      assert_abs_diff_eq!(
        tree.nodes[index].length,
        original.nodes[index].length,
        epsilon = 1e-12
      );
    }
    // rerooting back at a leaf hanging off the original root restores the
    // remaining path edges
    tree.reroot("dog").unwrap();
    assert_eq!(tree.nodes[13].parent, 0);
    assert_abs_diff_eq!(tree.nodes[1].length, 0.8, epsilon = 1e-9);
    assert_abs_diff_eq!(tree.nodes[4].length, 3.9, epsilon = 1e-9);
  }

  #[test]
  fn reroot_requires_a_known_label() {
    let mut tree = parse_newick(FIVE_TAXA).unwrap();
    assert!(tree.reroot("Z").is_err());
  }

  #[test]
  fn alignment_order_matches_reference_walk() {
    let tree = parse_newick(FIVE_TAXA).unwrap();
    let order = tree.alignment_order();
    let (leaves, distances): (Vec<usize>, Vec<f64>) = order.into_iter().unzip();
    assert_eq!(leaves, vec![4, 5, 3, 1, 6]);
    assert_abs_diff_eq!(distances[0], 0.0);
    assert_abs_diff_eq!(distances[1], 7.0);
    assert_abs_diff_eq!(distances[2], 5.0);
    assert_abs_diff_eq!(distances[3], 11.0);
    assert_abs_diff_eq!(distances[4], 11.0);
  }

  #[test]
  fn distances_to_the_reference_leaf() {
    let mut tree = parse_newick(MAMMALS).unwrap();
    tree.reroot("dog").unwrap();
    let dog = tree.find_node("dog").unwrap();
    assert_abs_diff_eq!(
      tree.distance_to_reference(dog, tree.find_node("raccoon").unwrap()),
      45.5,
      epsilon = 1e-9
    );
    assert_abs_diff_eq!(
      tree.distance_to_reference(dog, tree.find_node("sea_lion").unwrap()),
      48.9,
      epsilon = 1e-9
    );
    assert_abs_diff_eq!(
      tree.distance_to_reference(dog, tree.find_node("weasel").unwrap()),
      50.4,
      epsilon = 1e-9
    );
    assert_abs_diff_eq!(
      tree.distance_to_reference(dog, tree.find_node("cat").unwrap()),
      99.2,
      epsilon = 1e-9
    );
  }
}
