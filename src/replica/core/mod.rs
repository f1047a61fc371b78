pub mod network_behaviour;
pub mod network_identity;
pub mod network_reader;
pub mod network_reader_extensions;
pub mod network_time;
pub mod network_writer;
pub mod network_writer_extensions;
pub mod remote_calls;
pub mod spawned;
pub mod sync_dictionary;
pub mod sync_list;
pub mod sync_object;
pub mod sync_var;
pub mod tools;
