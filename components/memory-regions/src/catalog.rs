use crate::region::MemoryRegion;

/// The regions of one device, in insertion order until [`RegionCatalog::sort_by_address`] is
/// called.
///
/// Names are not required to be unique and regions may overlap; lookups return the first match.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RegionCatalog {
    regions: Vec<MemoryRegion>,
}

impl RegionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, region: MemoryRegion) {
        self.regions.push(region);
    }

    pub fn find_by_name(&self, name: &str) -> Option<&MemoryRegion> {
        self.regions.iter().find(|region| region.name() == name)
    }

    pub fn get(&self, index: usize) -> Option<&MemoryRegion> {
        self.regions.get(index)
    }

    /// Replaces the first region called `name` with `regions`, keeping their position.
    ///
    /// Returns the removed region, or `None` if there is no such region, in which case the
    /// catalog is left unchanged.
    pub fn replace<I>(&mut self, name: &str, regions: I) -> Option<MemoryRegion>
    where
        I: IntoIterator<Item = MemoryRegion>,
    {
        let index = self.regions.iter().position(|region| region.name() == name)?;
        self.replace_at(index, regions)
    }

    /// Replaces the region at `index` with `regions`, keeping their position.
    ///
    /// Returns the removed region, or `None` if `index` is out of bounds, in which case the
    /// catalog is left unchanged.
    pub fn replace_at<I>(&mut self, index: usize, regions: I) -> Option<MemoryRegion>
    where
        I: IntoIterator<Item = MemoryRegion>,
    {
        if index >= self.regions.len() {
            return None;
        }
        self.regions.splice(index..=index, regions).next()
    }

    /// Sorts the regions by ascending start address.  Regions with the same start keep their
    /// relative order.  Transformations that move regions do not re-sort the catalog.
    pub fn sort_by_address(&mut self) {
        self.regions.sort_by(MemoryRegion::address_order);
    }

    pub fn is_sorted_by_address(&self) -> bool {
        self.regions
            .windows(2)
            .all(|pair| pair[0].start() <= pair[1].start())
    }

    pub fn iter(&self) -> core::slice::Iter<'_, MemoryRegion> {
        self.regions.iter()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

impl Extend<MemoryRegion> for RegionCatalog {
    fn extend<T: IntoIterator<Item = MemoryRegion>>(&mut self, iter: T) {
        self.regions.extend(iter);
    }
}

impl FromIterator<MemoryRegion> for RegionCatalog {
    fn from_iter<T: IntoIterator<Item = MemoryRegion>>(iter: T) -> Self {
        Self {
            regions: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for RegionCatalog {
    type Item = MemoryRegion;
    type IntoIter = std::vec::IntoIter<MemoryRegion>;

    fn into_iter(self) -> Self::IntoIter {
        self.regions.into_iter()
    }
}

impl<'a> IntoIterator for &'a RegionCatalog {
    type Item = &'a MemoryRegion;
    type IntoIter = core::slice::Iter<'a, MemoryRegion>;

    fn into_iter(self) -> Self::IntoIter {
        self.regions.iter()
    }
}
