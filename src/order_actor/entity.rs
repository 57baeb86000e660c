use crate::actor_framework::Entity;
use crate::domain::{Order, OrderCreate, OrderStatus};
use super::actions::{OrderAction, OrderActionResult};

impl Entity for Order {
    type Id = String;
    type CreateParams = OrderCreate;
    type Action = OrderAction;
    type ActionResult = OrderActionResult;

    fn id(&self) -> &String {
        &self.id
    }

    /// Creates a new Order from a checkout payload.
    ///
    /// The order starts as `Confirmed` and its total is the sum of its lines.
    fn from_create_params(id: String, params: OrderCreate) -> Result<Self, String> {
        if params.user_id.is_empty() {
            return Err("Order must belong to a user".to_string());
        }
        if params.items.is_empty() {
            return Err("Order must contain at least one item".to_string());
        }
        if let Some(item) = params.items.iter().find(|i| i.quantity == 0) {
            return Err(format!("Invalid quantity for {}", item.name));
        }
        if let Some(item) = params.items.iter().find(|i| !i.price.is_finite() || i.price < 0.0) {
            return Err(format!("Invalid price for {}", item.name));
        }

        let total: f64 = params.items.iter().map(|i| i.line_total()).sum();
        Ok(Self {
            id,
            user_id: params.user_id,
            created_at: params.created_at,
            status: OrderStatus::Confirmed,
            items: params.items,
            total,
            delivery_address: params.delivery_address,
            special_instructions: params.special_instructions,
        })
    }

    /// Guards overwrites of a stored order.
    ///
    /// Ownership and placement time never change, terminal orders stay as they
    /// are, and journey statuses never move backwards.
    fn on_replace(&self, next: &Self) -> Result<(), String> {
        if next.user_id != self.user_id || next.created_at != self.created_at {
            return Err(format!("Order {} owner and placement time are immutable", self.id));
        }
        if self.status.is_terminal() && next.status != self.status {
            return Err(format!("Order {} is already {}", self.id, self.status));
        }
        if let (Some(current), Some(proposed)) =
            (self.status.journey_index(), next.status.journey_index())
        {
            if proposed < current {
                return Err(format!(
                    "Order {} cannot move back from {} to {}",
                    self.id, self.status, next.status
                ));
            }
        }
        Ok(())
    }

    /// Handles order-specific actions.
    ///
    /// # Errors
    /// `Cancel` fails for delivered orders and orders with an unrecognised status.
    fn handle_action(&mut self, action: OrderAction) -> Result<OrderActionResult, String> {
        match action {
            OrderAction::Cancel { user_id } => {
                if !self.is_owned_by(&user_id) {
                    return Ok(OrderActionResult::NotOwned);
                }
                match self.status {
                    OrderStatus::Cancelled => Ok(OrderActionResult::Cancel(false)),
                    OrderStatus::Delivered => {
                        Err(format!("Order {} was already delivered", self.id))
                    }
                    OrderStatus::Unknown => {
                        Err(format!("Order {} has an unrecognised status", self.id))
                    }
                    _ => {
                        self.status = OrderStatus::Cancelled;
                        Ok(OrderActionResult::Cancel(true))
                    }
                }
            }
        }
    }
}
