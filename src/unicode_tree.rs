//! Draw a tree with box-drawing characters.
//!
//! Modified from: <https://docs.rs/ascii_tree/0.1.1/src/ascii_tree/lib.rs.html>

use std::fmt::Display;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    label: Vec<String>,
    children: Vec<Tree>,
}

impl Tree {
    pub fn leaf(label: impl AsRef<str>) -> Self {
        Self {
            label: label.as_ref().lines().map(|line| line.to_owned()).collect(),
            children: Vec::new(),
        }
    }

    /// Build a tree from nodes listed depth-first, where depth 0 is a child of the root.
    pub fn from_preorder<S: AsRef<str>>(
        root: impl AsRef<str>,
        nodes: impl IntoIterator<Item = (usize, S)>,
    ) -> Self {
        // `stack[n]` is the most recent node at depth `n - 1`.
        let mut stack = vec![Self::leaf(root)];
        for (depth, label) in nodes {
            while stack.len() > depth + 1 {
                Self::pop_into_parent(&mut stack);
            }
            stack.push(Self::leaf(label));
        }
        while stack.len() > 1 {
            Self::pop_into_parent(&mut stack);
        }
        stack.pop().expect("The root is never popped")
    }

    fn pop_into_parent(stack: &mut Vec<Self>) {
        if let Some(child) = stack.pop() {
            if let Some(parent) = stack.last_mut() {
                parent.children.push(child);
            }
        }
    }

    #[cfg(test)]
    pub fn new_from(label: impl AsRef<str>, children: impl IntoIterator<Item = Tree>) -> Self {
        Self {
            children: children.into_iter().collect(),
            ..Self::leaf(label)
        }
    }
}

impl Display for Tree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_tree_element(f, self, &mut vec![])
    }
}

fn write_tree_element(
    f: &mut std::fmt::Formatter<'_>,
    tree: &Tree,
    level: &mut Vec<usize>,
) -> std::fmt::Result {
    const EMPTY: &str = "  ";
    const EDGE: &str = "└─";
    const PIPE: &str = "│ ";
    const BRANCH: &str = "├─";

    let maxpos = level.len();
    let mut second_line = String::new();
    for (pos, l) in level.iter().enumerate() {
        let prefix: &str = if pos == 0 { "" } else { " " };
        let last_row = pos == maxpos - 1;
        second_line.push_str(prefix);
        if *l == 1 {
            if last_row {
                write!(f, "{prefix}{EDGE}")?
            } else {
                write!(f, "{prefix}{EMPTY}")?
            }
            second_line.push_str(EMPTY);
        } else {
            if last_row {
                write!(f, "{prefix}{BRANCH}")?
            } else {
                write!(f, "{prefix}{PIPE}")?
            }
            second_line.push_str(PIPE);
        }
    }

    let prefix: &str = if maxpos == 0 { "" } else { " " };
    for (i, s) in tree.label.iter().enumerate() {
        match i {
            0 => writeln!(f, "{prefix}{s}")?,
            _ => writeln!(f, "{second_line}{prefix}{s}")?,
        }
    }

    let mut children_remaining = tree.children.len();
    for child in &tree.children {
        level.push(children_remaining);
        children_remaining -= 1;
        write_tree_element(f, child, level)?;
        level.pop();
    }

    Ok(())
}
