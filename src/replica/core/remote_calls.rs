use crate::replica::core::network_identity::NetworkIdentity;
use crate::replica::core::network_reader::NetworkReader;
use crate::replica::core::tools::stable_hash::StableHash;
use dashmap::mapref::one::Ref;
use dashmap::DashMap;
use lazy_static::lazy_static;
use tklog::error;

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum RemoteCallType {
    // client to server
    Command,
    // server to every observing client
    ClientRpc,
    // server to one specific client
    TargetRpc,
}

/// Plain function pointer so registrations of the same handler compare equal,
/// which is what makes re-registration idempotent.
pub type RemoteCallDelegate = fn(
    identity: &mut NetworkIdentity,
    component_index: u8,
    reader: &mut NetworkReader,
    conn_id: u64,
);

pub struct Invoker {
    pub type_name: &'static str,
    pub method_name: &'static str,
    pub call_type: RemoteCallType,
    pub function: RemoteCallDelegate,
    pub cmd_requires_authority: bool,
}

impl Invoker {
    pub fn new(
        type_name: &'static str,
        method_name: &'static str,
        call_type: RemoteCallType,
        function: RemoteCallDelegate,
        cmd_requires_authority: bool,
    ) -> Self {
        Invoker {
            type_name,
            method_name,
            call_type,
            function,
            cmd_requires_authority,
        }
    }

    pub fn are_equal(
        &self,
        type_name: &str,
        method_name: &str,
        call_type: RemoteCallType,
        function: RemoteCallDelegate,
    ) -> bool {
        self.type_name == type_name
            && self.method_name == method_name
            && self.call_type == call_type
            && self.function == function
    }

    pub fn full_name(&self) -> String {
        format!("{}.{}", self.type_name, self.method_name)
    }
}

lazy_static! {
    static ref REMOTE_CALL_DELEGATES: DashMap<u16, Invoker> = DashMap::new();
}

pub struct RemoteProcedureCalls;

impl RemoteProcedureCalls {
    pub fn get_method_hash(type_name: &str, method_name: &str) -> u16 {
        format!("{}.{}", type_name, method_name).get_fn_stable_hash_code()
    }

    /// Registers a remote call handler under the stable hash of
    /// `Type.Method`. Re-registering the exact same handler is a no-op. Any
    /// other occupant of the hash is a caller error: both members are named
    /// in the log, the original registration stays, and its hash is returned.
    pub fn register_delegate(
        type_name: &'static str,
        method_name: &'static str,
        call_type: RemoteCallType,
        function: RemoteCallDelegate,
        cmd_requires_authority: bool,
    ) -> u16 {
        let hash = Self::get_method_hash(type_name, method_name);
        if let Some(old_invoker) = REMOTE_CALL_DELEGATES.get(&hash) {
            if old_invoker.are_equal(type_name, method_name, call_type, function) {
                return hash;
            }
            error!(format!(
                "Function {} and {}.{} have the same hash. Please rename one of them",
                old_invoker.full_name(),
                type_name,
                method_name
            ));
            return hash;
        }
        let invoker = Invoker::new(
            type_name,
            method_name,
            call_type,
            function,
            cmd_requires_authority,
        );
        REMOTE_CALL_DELEGATES.insert(hash, invoker);
        hash
    }

    pub fn register_command_delegate(
        type_name: &'static str,
        method_name: &'static str,
        function: RemoteCallDelegate,
        cmd_requires_authority: bool,
    ) -> u16 {
        Self::register_delegate(
            type_name,
            method_name,
            RemoteCallType::Command,
            function,
            cmd_requires_authority,
        )
    }

    pub fn register_rpc_delegate(
        type_name: &'static str,
        method_name: &'static str,
        function: RemoteCallDelegate,
    ) -> u16 {
        Self::register_delegate(type_name, method_name, RemoteCallType::ClientRpc, function, true)
    }

    pub fn register_target_rpc_delegate(
        type_name: &'static str,
        method_name: &'static str,
        function: RemoteCallDelegate,
    ) -> u16 {
        Self::register_delegate(type_name, method_name, RemoteCallType::TargetRpc, function, true)
    }

    // removing an unknown hash is a no-op, teardown only
    pub fn remove_delegate(func_hash: u16) {
        REMOTE_CALL_DELEGATES.remove(&func_hash);
    }

    pub fn get_delegate(func_hash: u16) -> Option<Ref<'static, u16, Invoker>> {
        REMOTE_CALL_DELEGATES.get(&func_hash)
    }

    pub fn get_function_method_name(func_hash: u16) -> Option<String> {
        REMOTE_CALL_DELEGATES
            .get(&func_hash)
            .map(|invoker| invoker.full_name())
    }

    pub fn command_requires_authority(func_hash: u16) -> bool {
        match REMOTE_CALL_DELEGATES.get(&func_hash) {
            Some(invoker) => invoker.cmd_requires_authority,
            None => false,
        }
    }

    pub fn invoke(
        func_hash: u16,
        call_type: RemoteCallType,
        identity: &mut NetworkIdentity,
        component_index: u8,
        reader: &mut NetworkReader,
        conn_id: u64,
    ) -> bool {
        // copy the pointer out so the registry is not locked during the call
        let function = match REMOTE_CALL_DELEGATES.get(&func_hash) {
            Some(invoker) if invoker.call_type == call_type => invoker.function,
            _ => return false,
        };
        function(identity, component_index, reader, conn_id);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delegate(
        _identity: &mut NetworkIdentity,
        _component_index: u8,
        _reader: &mut NetworkReader,
        _conn_id: u64,
    ) {
    }

    fn delegate2(
        _identity: &mut NetworkIdentity,
        _component_index: u8,
        _reader: &mut NetworkReader,
        _conn_id: u64,
    ) {
    }

    #[test]
    fn test_register_is_idempotent() {
        let hash1 = RemoteProcedureCalls::register_command_delegate(
            "DelegateComponent",
            "Delegate",
            delegate,
            false,
        );
        let hash2 = RemoteProcedureCalls::register_command_delegate(
            "DelegateComponent",
            "Delegate",
            delegate,
            false,
        );
        assert_eq!(hash1, hash2);

        RemoteProcedureCalls::remove_delegate(hash1);
    }

    #[test]
    fn test_collision_keeps_original() {
        let hash = RemoteProcedureCalls::register_command_delegate(
            "CollisionComponent",
            "Collide",
            delegate,
            false,
        );
        // same name, different handler: rejected, original survives
        let hash2 = RemoteProcedureCalls::register_command_delegate(
            "CollisionComponent",
            "Collide",
            delegate2,
            false,
        );
        assert_eq!(hash, hash2);
        let registered = RemoteProcedureCalls::get_delegate(hash).unwrap();
        assert!(registered.function == (delegate as RemoteCallDelegate));
        drop(registered);

        RemoteProcedureCalls::remove_delegate(hash);
    }

    #[test]
    fn test_unknown_hash_lookups_never_panic() {
        assert!(RemoteProcedureCalls::get_delegate(0xFFFE).is_none());
        assert!(RemoteProcedureCalls::get_function_method_name(0xFFFE).is_none());
        assert!(!RemoteProcedureCalls::command_requires_authority(0xFFFE));
        // removing a hash that was never registered is fine
        RemoteProcedureCalls::remove_delegate(0xFFFE);
    }

    #[test]
    fn test_method_hash_is_stable() {
        let a = RemoteProcedureCalls::get_method_hash("PlayerScript", "CmdShoot");
        let b = RemoteProcedureCalls::get_method_hash("PlayerScript", "CmdShoot");
        assert_eq!(a, b);
        assert_ne!(
            a,
            RemoteProcedureCalls::get_method_hash("PlayerScript", "CmdReload")
        );
    }

    #[test]
    fn test_function_method_name() {
        let hash = RemoteProcedureCalls::register_rpc_delegate(
            "NamedComponent",
            "RpcNamed",
            delegate,
        );
        assert_eq!(
            RemoteProcedureCalls::get_function_method_name(hash),
            Some("NamedComponent.RpcNamed".to_string())
        );
        RemoteProcedureCalls::remove_delegate(hash);
    }

    #[test]
    fn test_invoke_checks_call_type() {
        let hash = RemoteProcedureCalls::register_command_delegate(
            "TypedComponent",
            "CmdTyped",
            delegate,
            false,
        );
        let mut identity = NetworkIdentity::new();
        let mut reader = NetworkReader::new(Vec::new());
        assert!(!RemoteProcedureCalls::invoke(
            hash,
            RemoteCallType::ClientRpc,
            &mut identity,
            0,
            &mut reader,
            0,
        ));
        assert!(RemoteProcedureCalls::invoke(
            hash,
            RemoteCallType::Command,
            &mut identity,
            0,
            &mut reader,
            0,
        ));
        RemoteProcedureCalls::remove_delegate(hash);
    }
}
