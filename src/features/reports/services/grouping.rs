//! Partitioning of maintenance records into report branches and grouping of
//! their photos by category label.

use uuid::Uuid;

use crate::features::reports::models::{
    Department, MaintenanceImage, MaintenanceRecord, MaintenanceScope,
};
use crate::shared::constants::OTHER_CATEGORY_LABEL;

/// Category labels the administration uses for its recurring work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownCategory {
    Rezanes,
    Impermeabilizacion,
    Pintura,
    Limpieza,
}

impl KnownCategory {
    pub fn label(self) -> &'static str {
        match self {
            KnownCategory::Rezanes => "REZANES",
            KnownCategory::Impermeabilizacion => "IMPERMEABILIZACION",
            KnownCategory::Pintura => "PINTURA",
            KnownCategory::Limpieza => "LIMPIEZA",
        }
    }

    /// Expects an upper-cased label
    fn parse(upper: &str) -> Option<Self> {
        match upper {
            "REZANES" => Some(KnownCategory::Rezanes),
            "IMPERMEABILIZACION" | "IMPERMEABILIZACIÓN" => Some(KnownCategory::Impermeabilizacion),
            "PINTURA" => Some(KnownCategory::Pintura),
            "LIMPIEZA" => Some(KnownCategory::Limpieza),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImageCategory {
    Known(KnownCategory),
    /// Any other non-empty label, kept as written (trimmed)
    Custom(String),
    /// Missing label, or the explicit "other" label
    Other,
}

impl ImageCategory {
    pub fn from_label(label: Option<&str>) -> Self {
        let Some(label) = label.map(str::trim).filter(|l| !l.is_empty()) else {
            return ImageCategory::Other;
        };

        let upper = label.to_uppercase();
        if upper == "OTRA" || upper == "OTHER" {
            return ImageCategory::Other;
        }

        KnownCategory::parse(&upper)
            .map(ImageCategory::Known)
            .unwrap_or_else(|| ImageCategory::Custom(label.to_string()))
    }

    /// Section heading printed in the document
    pub fn heading(&self) -> &str {
        match self {
            ImageCategory::Known(known) => known.label(),
            ImageCategory::Custom(label) => label.as_str(),
            ImageCategory::Other => OTHER_CATEGORY_LABEL,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryGroup {
    pub category: ImageCategory,
    pub images: Vec<MaintenanceImage>,
}

/// Images grouped by category, in order of first occurrence
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryGroups {
    groups: Vec<CategoryGroup>,
}

impl CategoryGroups {
    pub fn from_images<I>(images: I) -> Self
    where
        I: IntoIterator<Item = MaintenanceImage>,
    {
        let mut groups: Vec<CategoryGroup> = Vec::new();

        for image in images {
            let category = ImageCategory::from_label(image.category.as_deref());
            match groups.iter_mut().find(|g| g.category == category) {
                Some(group) => group.images.push(image),
                None => groups.push(CategoryGroup {
                    category,
                    images: vec![image],
                }),
            }
        }

        Self { groups }
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryGroup> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn image_count(&self) -> usize {
        self.groups.iter().map(|g| g.images.len()).sum()
    }
}

/// All records of one department inside the window
#[derive(Debug, Clone, PartialEq)]
pub struct DepartmentBucket {
    pub department: Department,
    pub records: Vec<MaintenanceRecord>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportBuckets {
    pub common_area: Vec<MaintenanceRecord>,
    pub departments: Vec<DepartmentBucket>,
}

impl ReportBuckets {
    pub fn is_empty(&self) -> bool {
        self.common_area.is_empty() && self.departments.is_empty()
    }
}

/// Split records into the common-area bucket and one bucket per department,
/// departments in order of first occurrence.
pub fn partition_records(records: Vec<MaintenanceRecord>) -> ReportBuckets {
    let mut buckets = ReportBuckets::default();

    for record in records {
        match record.scope {
            MaintenanceScope::CommonArea => buckets.common_area.push(record),
            MaintenanceScope::Department => {
                let Some(department) = record.department.clone() else {
                    tracing::warn!(
                        record_id = %record.id,
                        department_id = ?record.department_id,
                        "Department record without department, skipped"
                    );
                    continue;
                };

                match bucket_for(&mut buckets.departments, department.id) {
                    Some(bucket) => bucket.records.push(record),
                    None => buckets.departments.push(DepartmentBucket {
                        department,
                        records: vec![record],
                    }),
                }
            }
        }
    }

    buckets
}

fn bucket_for(buckets: &mut [DepartmentBucket], id: Uuid) -> Option<&mut DepartmentBucket> {
    buckets.iter_mut().find(|b| b.department.id == id)
}

/// Flatten the records' images (each record's in display order) and group them.
pub fn group_images(records: &[MaintenanceRecord]) -> CategoryGroups {
    CategoryGroups::from_images(records.iter().flat_map(|record| {
        let mut images = record.images.clone();
        images.sort_by_key(|image| image.display_order);
        images
    }))
}
