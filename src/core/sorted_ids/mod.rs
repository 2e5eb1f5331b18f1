mod sorted_id_array;

pub use sorted_id_array::SortedIdArray;
