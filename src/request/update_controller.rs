//! Add or remove a token controller

use serde_json::{json, Map, Value};

use super::base::{require_token_id, write_token_json};
use super::options::Options;
use super::{
    check_type, Controller, ControllerAction, Preimage, RequestBase, RequestError, RequestKind,
    RequestType,
};
use crate::crypto::Hash;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateController {
    base: RequestBase,
    token_id: Option<Hash>,
    action: ControllerAction,
    controller: Option<Controller>,
}

impl UpdateController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(value: &Value) -> Result<Self, RequestError> {
        check_type(value, RequestType::UpdateController)?;
        let options = Options::new(value)?;
        Ok(UpdateController {
            base: RequestBase::from_options(&options)?,
            token_id: options.token_id()?,
            action: options
                .str("action", "action", "action")?
                .map(str::parse::<ControllerAction>)
                .transpose()?
                .unwrap_or_default(),
            controller: options
                .get("controller", "controller")
                .map(Controller::from_value)
                .transpose()?,
        })
    }

    pub fn token_id(&self) -> Option<Hash> {
        self.token_id
    }

    pub fn set_token_id(&mut self, token_id: Hash) {
        self.token_id = Some(token_id);
    }

    pub fn action(&self) -> ControllerAction {
        self.action
    }

    pub fn set_action(&mut self, action: ControllerAction) {
        self.action = action;
    }

    pub fn controller(&self) -> Option<&Controller> {
        self.controller.as_ref()
    }

    pub fn set_controller(&mut self, controller: Controller) {
        self.controller = Some(controller);
    }
}

impl RequestKind for UpdateController {
    const TYPE: RequestType = RequestType::UpdateController;

    fn base(&self) -> &RequestBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut RequestBase {
        &mut self.base
    }

    fn write_fields(&self, preimage: &mut Preimage) -> Result<(), RequestError> {
        let token_id = require_token_id(self.token_id)?;
        let controller = self.controller.ok_or(RequestError::Missing("controller"))?;
        preimage
            .hash(&token_id)
            .byte(self.action.code())
            .key(&controller.account)
            .bitfield(controller.privileges.bits());
        Ok(())
    }

    fn write_json(&self, json: &mut Map<String, Value>) {
        write_token_json(json, self.token_id);
        json.insert("action".into(), json!(self.action.as_str()));
        if let Some(controller) = &self.controller {
            json.insert("controller".into(), controller.to_json());
        }
    }
}
