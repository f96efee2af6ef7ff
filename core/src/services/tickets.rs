use tracing::info;
use uuid::Uuid;

use crate::api::Api;
use crate::error::ClientError;
use crate::session::SessionStore;
use crate::transport::Transport;
use crate::types::{PurchaseTicket, Ticket};

/// Ticket purchase and listing for buyers.
pub struct TicketService<'a, T, S> {
    api: &'a Api<T, S>,
}

impl<'a, T: Transport, S: SessionStore> TicketService<'a, T, S> {
    pub(crate) fn new(api: &'a Api<T, S>) -> Self {
        Self { api }
    }

    /// Tickets held by the signed-in buyer.
    pub fn list(&self) -> Result<Vec<Ticket>, ClientError> {
        self.api
            .authorized(|c, s| c.build_list_tickets(s), |c, r| c.parse_tickets(r))
    }

    /// Buy a ticket for `event_id`. Every call creates a new ticket.
    pub fn purchase(&self, event_id: Uuid) -> Result<Ticket, ClientError> {
        PurchaseTicket { event_id }.validate()?;
        let ticket = self
            .api
            .authorized(|c, s| c.build_purchase_ticket(s, event_id), |c, r| c.parse_ticket(r))?;
        info!(ticket_id = %ticket.id, event_id = %event_id, "ticket purchased");
        Ok(ticket)
    }
}
