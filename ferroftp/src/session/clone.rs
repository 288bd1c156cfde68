//! # Clone
//!
//! Independent sessions connected with the settings of an existing one

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use super::{ControlSession, SessionState, TlsStream};
use crate::cancel::CancellationToken;
use crate::types::FtpResult;

/// Builds connected copies of a session, used to run work in parallel.
///
/// A clone shares no mutable state with its parent. It inherits the capabilities and the
/// system type learnt by the parent, so `FEAT` and `SYST` aren't sent again, and it accepts
/// the certificate the parent accepted without calling the validator.
pub struct SessionCloner;

impl SessionCloner {
    /// Create a new session from `session` and connect it
    pub fn clone_session<T>(session: &ControlSession<T>) -> FtpResult<ControlSession<T>>
    where
        T: TlsStream,
    {
        let mut clone = Self::prepare(session);
        clone.log.debug(format!(
            "Cloning session to {}:{}",
            clone.config.host, clone.config.port
        ));
        clone.connect()?;
        Ok(clone)
    }

    /// Disconnected copy of `session`
    fn prepare<T>(session: &ControlSession<T>) -> ControlSession<T>
    where
        T: TlsStream,
    {
        ControlSession {
            config: session.config.clone(),
            reader: None,
            state: SessionState::Disconnected,
            tls: session.tls.clone(),
            certificate_validator: session.certificate_validator.clone(),
            accepted_certificate: session.accepted_certificate.clone(),
            transport: Arc::clone(&session.transport),
            log: session.log.clone(),
            cancel: CancellationToken::new(),
            capabilities: session.capabilities.clone(),
            system_type: session.system_type.clone(),
            dialect: session.dialect,
            welcome_msg: None,
            encoding: session.config.encoding.unwrap_or_default(),
            encrypted: false,
            epsv_unsupported: session.epsv_unsupported,
            working_dir: session.working_dir.clone(),
            pending_reply: Arc::new(AtomicBool::new(false)),
            is_clone: true,
        }
    }
}

impl<T> ControlSession<T>
where
    T: TlsStream,
{
    /// Open a new connection with the settings of this session.
    /// See [`SessionCloner::clone_session`].
    pub fn try_clone(&self) -> FtpResult<Self> {
        SessionCloner::clone_session(self)
    }
}
