//! Newick guide-tree parsing.
//!
//! Grammar:
//!
//! ```text
//! tree   := node (';')?
//! node   := leaf | inode
//! leaf   := label length
//! inode  := '(' node (',' node)* ')' label? length
//! label  := [-0-9A-Za-z/%_.]+
//! length := (':' float)?        // default 0
//! ```
//!
//! Whitespace (spaces, tabs, newlines) is removed before parsing. Quoted
//! labels are not supported. The result is a flat node arena with parent
//! links; the root is its own parent at index 0.

use crate::invalid_input;
use crate::io::file::read_file_to_string;
use eyre::{Report, WrapErr};
use nom::branch::alt;
use nom::bytes::complete::take_while1;
use nom::character::complete::char;
use nom::combinator::{map, opt};
use nom::multi::separated_list1;
use nom::number::complete::double;
use nom::sequence::{delimited, pair, preceded, tuple};
use nom::IResult;
use std::path::Path;

/// One node of the flattened guide tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
  pub label: String,
  pub length: f64,
  pub is_leaf: bool,
  pub parent: usize,
  pub children: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GuideTree {
  pub nodes: Vec<TreeNode>,
}

impl GuideTree {
  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  pub fn leaves(&self) -> impl Iterator<Item = usize> + '_ {
    (0..self.nodes.len()).filter(|i| self.nodes[*i].is_leaf)
  }

  /// Recompute the children lists from the parent links. Needed after any
  /// operation that rewires parents (rerooting).
  pub fn rebuild_children(&mut self) {
    for node in &mut self.nodes {
      node.children.clear();
    }
    for index in 0..self.nodes.len() {
      let parent = self.nodes[index].parent;
      if parent != index {
        self.nodes[parent].children.push(index);
      }
    }
  }
}

/// Recursive shape produced by the parser before flattening into the arena.
#[derive(Debug)]
struct ParsedNode {
  label: String,
  length: f64,
  children: Vec<ParsedNode>,
}

fn label(input: &str) -> IResult<&str, &str> {
  take_while1(|c: char| c.is_ascii_alphanumeric() || "-/%_.".contains(c))(input)
}

fn length(input: &str) -> IResult<&str, f64> {
  map(opt(preceded(char(':'), double)), |len| len.unwrap_or(0.0))(input)
}

fn leaf(input: &str) -> IResult<&str, ParsedNode> {
  map(pair(label, length), |(label, length)| ParsedNode {
    label: label.to_owned(),
    length,
    children: Vec::new(),
  })(input)
}

fn inode(input: &str) -> IResult<&str, ParsedNode> {
  map(
    tuple((
      delimited(char('('), separated_list1(char(','), node), char(')')),
      opt(label),
      length,
    )),
    |(children, label, length)| ParsedNode {
      label: label.unwrap_or("").to_owned(),
      length,
      children,
    },
  )(input)
}

fn node(input: &str) -> IResult<&str, ParsedNode> {
  alt((leaf, inode))(input)
}

fn flatten(parsed: ParsedNode, parent: usize, tree: &mut GuideTree) {
  let index = tree.nodes.len();
  tree.nodes.push(TreeNode {
    label: parsed.label,
    length: parsed.length,
    is_leaf: parsed.children.is_empty(),
    parent,
    children: Vec::new(),
  });
  for child in parsed.children {
    flatten(child, index, tree);
  }
}

/// Parse a Newick string into the flat arena.
pub fn parse_newick(text: &str) -> Result<GuideTree, Report> {
  let stripped: String = text.chars().filter(|c| !c.is_whitespace()).collect();
  let result = match pair(node, opt(char(';')))(stripped.as_str()) {
    Ok(("", (parsed, _))) => {
      let mut tree = GuideTree::default();
      flatten(parsed, 0, &mut tree);
      tree.rebuild_children();
      Ok(tree)
    }
    Ok((rest, _)) => invalid_input!("trailing characters in Newick tree: '{rest}'"),
    Err(e) => invalid_input!("malformed Newick tree: {e}"),
  };
  result
}

pub fn read_newick_file(path: &Path) -> Result<GuideTree, Report> {
  let text = read_file_to_string(path)?;
  if text.trim().is_empty() {
    return invalid_input!("Newick file {path:?} is empty");
  }
  parse_newick(&text).wrap_err_with(|| format!("when parsing Newick file {path:?}"))
}
