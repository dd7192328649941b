//! Per-group summary table.

use std::fmt;
use std::io::Write;

use super::walker::collect_groups;
use crate::container::{Container, Node};
use crate::util::{path, DType, Error, Result};

/// Shown in the type column of groups without datasets.
pub const NONE_DTYPE: &str = "none";

/// Key of the dataset sampled for a group's element type.
pub const SAMPLE_KEY: &str = "0";

const BANNER: &str =
    "------------------------------------------ Log File Info --------------------------------------------";
const RULE: &str =
    "------------------------------------------------------------------------------------------------------";

/// Child counts and sampled element type of one group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupInfo {
    /// Group path with trailing separator.
    pub path: String,
    pub groups: usize,
    pub datasets: usize,
    /// Type of the child keyed [`SAMPLE_KEY`]; `None` without datasets.
    pub dtype: Option<DType>,
}

impl GroupInfo {
    /// Type column text.
    pub fn dtype_name(&self) -> &'static str {
        self.dtype.map_or(NONE_DTYPE, DType::name)
    }
}

impl fmt::Display for GroupInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<45} {:<20} {:<25} {:<10}",
            format!("  {}", self.path),
            self.groups,
            self.datasets,
            self.dtype_name()
        )
    }
}

/// Count a group's immediate children by kind and sample its element type.
///
/// A group with datasets must have a child named `"0"`; its absence is
/// reported as [`Error::NodeNotFound`].
pub fn group_info<C: Container + ?Sized>(container: &C, group: &str) -> Result<GroupInfo> {
    let mut groups = 0;
    let mut datasets = 0;

    for key in container.children(group)? {
        match container.node(&path::join(group, &key))? {
            Node::Group { .. } => groups += 1,
            Node::Dataset { .. } => datasets += 1,
        }
    }

    let dtype = if datasets > 0 {
        match container.node(&path::join(group, SAMPLE_KEY))? {
            Node::Dataset { dtype, .. } => Some(dtype),
            Node::Group { .. } => {
                return Err(Error::kind_mismatch(
                    path::join(group, SAMPLE_KEY),
                    "dataset",
                    "group",
                ))
            }
        }
    } else {
        None
    };

    Ok(GroupInfo {
        path: path::as_group(group),
        groups,
        datasets,
        dtype,
    })
}

/// Write the summary line of one group.
pub fn print_group_info<C, W>(container: &C, group: &str, out: &mut W) -> Result<()>
where
    C: Container + ?Sized,
    W: Write + ?Sized,
{
    let info = group_info(container, group)?;
    writeln!(out, "{}", info)?;
    Ok(())
}

/// Write the file banner, column header and one line per group.
pub fn print_file_info<C, W>(container: &C, file_name: &str, out: &mut W) -> Result<()>
where
    C: Container + ?Sized,
    W: Write + ?Sized,
{
    writeln!(out, "\n\n{}\n\n", BANNER)?;
    writeln!(out, "File: {}\n", file_name)?;
    writeln!(
        out,
        "{:<45} {:<20} {:<25} {:<10}",
        "Group ", "Total Groups ", "Total Datasets ", "Data Type "
    )?;
    writeln!(out)?;

    for group in collect_groups(container)? {
        print_group_info(container, &group, out)?;
    }

    writeln!(out, "{}", RULE)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{MemoryArchive, RawBuffer};

    #[test]
    fn test_group_info_counts() {
        let mut a = MemoryArchive::new();
        a.insert_dataset("cam/0", RawBuffer::from_slice(&[1i32]))
            .unwrap()
            .insert_dataset("cam/1", RawBuffer::from_slice(&[2i32]))
            .unwrap()
            .insert_group("cam/meta")
            .unwrap();

        let info = group_info(&a, "cam/").unwrap();
        assert_eq!(
            info,
            GroupInfo {
                path: "cam/".into(),
                groups: 1,
                datasets: 2,
                dtype: Some(DType::Int32),
            }
        );
    }

    #[test]
    fn test_group_without_datasets_reports_none() {
        let mut a = MemoryArchive::new();
        a.insert_group("outer/inner").unwrap();
        let info = group_info(&a, "outer").unwrap();
        assert_eq!(info.dtype, None);
        assert_eq!(info.dtype_name(), "none");
        assert_eq!(info.groups, 1);
    }

    #[test]
    fn test_missing_sample_key_is_error() {
        let mut a = MemoryArchive::new();
        a.insert_dataset("cam/5", RawBuffer::from_slice(&[1u8])).unwrap();
        assert!(matches!(group_info(&a, "cam"), Err(Error::NodeNotFound(p)) if p == "cam/0"));
    }

    #[test]
    fn test_line_format() {
        let info = GroupInfo {
            path: "cam/".into(),
            groups: 0,
            datasets: 11,
            dtype: Some(DType::Uint8),
        };
        let line = info.to_string();
        assert_eq!(&line[..6], "  cam/");
        assert_eq!(&line[46..48], "0 ");
        assert_eq!(&line[67..69], "11");
        assert_eq!(line[93..].trim_end(), "uint8");
        assert_eq!(line.len(), 45 + 1 + 20 + 1 + 25 + 1 + 10);
    }

    #[test]
    fn test_print_file_info() {
        let mut a = MemoryArchive::new();
        a.insert_dataset("cam/0", RawBuffer::from_slice(&[1u8]))
            .unwrap()
            .insert_group("empty")
            .unwrap();

        let mut out = Vec::new();
        print_file_info(&a, "run.plog", &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Log File Info"));
        assert!(text.contains("File: run.plog\n"));
        let rows: Vec<&str> = text.lines().filter(|l| l.starts_with("  ")).collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].starts_with("  cam/") && rows[0].trim_end().ends_with("uint8"));
        assert!(rows[1].starts_with("  empty/") && rows[1].trim_end().ends_with("none"));
    }

    #[test]
    fn test_print_file_info_propagates_errors() {
        let mut a = MemoryArchive::new();
        a.insert_dataset("cam/3", RawBuffer::from_slice(&[1u8])).unwrap();
        let mut out = Vec::new();
        assert!(print_file_info(&a, "x", &mut out).is_err());
    }
}
